use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use managed_server_core::stack::{declare_stack, lambda_binaries, validate_stack};
use managed_server_core::terraform::render_terraform_json;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const INFRA_DIR: &str = "infra/managed_server";
const LAMBDA_PACKAGE: &str = "managed_server_lambda";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the managed-server Lambda demo workspace",
    long_about = "Builds and zips the Lambda binaries, renders the Terraform\n\
                  configuration for a region, and runs CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package the Lambda binaries as `bootstrap` zip archives
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Render the stack as Terraform JSON
    StackManifest {
        /// Region every resource is provisioned in
        #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
        region: String,
        /// Output file path
        #[arg(long, default_value = "infra/managed_server/main.tf.json")]
        output: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Workspace tests
    Test,
    /// Lint + test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn fail(message: impl AsRef<str>) -> ! {
    eprintln!("error: {}", message.as_ref());
    exit(1);
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .unwrap_or_else(|error| fail(format!("failed to execute cargo: {error}")))
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

// ── packaging ──────────────────────────────────────────────────────

fn package_serverless_lambdas(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build Lambda binaries");
    let binaries = lambda_binaries();
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for binary in &binaries {
        cargo_args.push("--bin");
        cargo_args.push(*binary);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package Lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(INFRA_DIR).join("dist");
    fs::create_dir_all(&dist_dir).unwrap_or_else(|error| {
        fail(format!(
            "failed to create '{}': {error}",
            dist_dir.display()
        ))
    });

    let mut packaged = Vec::new();
    for binary in binaries {
        let zip_path = dist_dir.join(format!("{binary}.zip"));
        package_lambda_zip(&target_dir.join(binary_name(binary, target)), &zip_path);
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        fail(format!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        ));
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        fail(format!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        ));
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        fail(format!(
            "expected lambda binary at '{}'",
            binary_path.display()
        ));
    }

    if let Err(message) = write_bootstrap_zip(binary_path, zip_path) {
        fail(format!("{}: {message}", zip_path.display()));
    }
}

fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) -> Result<(), String> {
    let binary = fs::read(binary_path).map_err(|error| format!("read binary: {error}"))?;
    let file = fs::File::create(zip_path).map_err(|error| format!("create archive: {error}"))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| format!("start bootstrap entry: {error}"))?;
    zip.write_all(&binary)
        .map_err(|error| format!("write bootstrap entry: {error}"))?;
    zip.finish()
        .map_err(|error| format!("finish archive: {error}"))?;
    Ok(())
}

// ── stack manifest ─────────────────────────────────────────────────

fn write_stack_manifest(region: &str, output: &Path) {
    step("Render Terraform configuration");
    let stack = declare_stack(region);
    if let Err(error) = validate_stack(&stack) {
        fail(format!("stack declaration is invalid: {error}"));
    }

    let rendered = serde_json::to_string_pretty(&render_terraform_json(&stack))
        .unwrap_or_else(|error| fail(format!("failed to serialize manifest: {error}")));

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).unwrap_or_else(|error| {
            fail(format!("failed to create '{}': {error}", parent.display()))
        });
    }
    fs::write(output, rendered + "\n").unwrap_or_else(|error| {
        fail(format!("failed to write '{}': {error}", output.display()))
    });

    eprintln!(
        "\nWrote {} ({} functions, {} outputs, region {region})",
        output.display(),
        stack.functions.len(),
        stack.outputs.len()
    );
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test managed_server_core");
    run_cargo(&["test", "-p", "managed_server_core"]);

    step("Test managed_server_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_lambdas(&target, profile);
        }
        Commands::StackManifest { region, output } => {
            write_stack_manifest(&region, &output);
        }
    }
}
