pub mod pacer;
pub mod state_store;
