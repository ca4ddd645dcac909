//! # Observability & Tracing
//!
//! Every store, binding and form operation logs through `tracing` with structured fields:
//!
//! - `store` - the [`StoreConfig::name`](crate::StoreConfig) of the store
//! - `key` - the record key or collection spec (`policy_P1`, `policy_*`)
//! - `size` / `notified` / `subscribers` - store size and fan-out after a write
//! - `consumer` / `form` - the view or form involved
//!
//! ## Levels
//!
//! | Level | What |
//! |-------|------|
//! | `info` | record created or deleted, write accepted, form submitted, consumer unmounted |
//! | `debug` | every other mutation, subscribe/dispose, rebind, field change |
//! | `warn` | rejected writes, panicking subscribers, failed submits |
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=record_store=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a rate edit reads:
//!
//! ```text
//! DEBUG Subscribed store="app" key=policy_P1 subscriber=3
//! DEBUG Field changed form="rate" field="rate" error=None
//! DEBUG submit{form="rate"}: Submitting patch=Patch({"rate": Number(120)})
//! DEBUG submit{form="rate"}: Merged store="app" key=policy_P1 fields=1 notified=1
//! INFO submit{form="rate"}: Submitted key=Some("policy_P1") fields=1
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once (tests, demos); later calls are no-ops.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // `store`/`key` fields already say where a line comes from
        .compact()
        .try_init();
}
