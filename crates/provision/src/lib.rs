pub mod adapter;
pub mod client;
pub mod context;
pub mod dynadot;
pub mod naming;
pub mod neon;
pub mod render;
pub mod supabase;

pub use adapter::{AdapterRegistry, ProvisionAdapter};
pub use client::{ApiClient, ApiOutcome};
pub use context::ProvisionContext;
pub use dynadot::DynadotAdapter;
pub use naming::{parse_domain, slugify, truncate};
pub use neon::NeonAdapter;
pub use render::RenderAdapter;
pub use supabase::SupabaseAdapter;
