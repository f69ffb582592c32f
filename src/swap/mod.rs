pub mod allowance;
pub mod calldata;
pub mod directory;
pub mod executor;
pub mod quote;
pub mod remittance;
pub mod router;

pub use allowance::AllowanceManager;
pub use calldata::{default_encoders, SwapCallEncoder, SwapLegParams};
pub use directory::ExchangeDirectory;
pub use executor::{ExecutorSettings, SwapExecutor, SwapProposal};
pub use quote::{QuoteEngine, QuoteSet};
pub use remittance::RemittanceHandler;
pub use router::RouteResolver;
