pub mod engine;
pub mod lookup;
pub mod plan;
pub mod remap;
pub mod transform;
pub mod upsert;
