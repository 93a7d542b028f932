// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the pipeline
// works with: driving-log records, cameras, and samples.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// One row of the simulator's driving log
pub mod record;

// An (image, steering angle) training pair
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
