use std::time::Duration;

pub const DEFAULT_FILE_SIZE: &str = "medium";
pub const BATCH_SIZE: u64 = 1_000;
pub const BATCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSize {
    Small,
    Medium,
    Large,
}

impl FileSize {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Number of one-second batches simulated for this size.
    pub fn batches(self) -> u32 {
        match self {
            Self::Small => 2,
            Self::Medium => 5,
            Self::Large => 10,
        }
    }
}

/// Work derived from the `file_size` query parameter.
///
/// The requested label is kept verbatim for the response even when it does
/// not name a known size; such requests run the medium workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingPlan {
    pub requested_size: String,
    pub batches: u32,
}

impl ProcessingPlan {
    pub fn for_request(file_size: Option<&str>) -> Self {
        let requested = file_size.unwrap_or(DEFAULT_FILE_SIZE);
        match FileSize::parse(requested) {
            Some(size) => Self::for_size(size),
            None => Self {
                requested_size: requested.to_string(),
                batches: FileSize::Medium.batches(),
            },
        }
    }

    pub fn for_size(size: FileSize) -> Self {
        Self {
            requested_size: size.as_str().to_string(),
            batches: size.batches(),
        }
    }

    pub fn expected_records(&self) -> u64 {
        u64::from(self.batches) * BATCH_SIZE
    }
}
