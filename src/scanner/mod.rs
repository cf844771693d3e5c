pub mod chain;
pub mod phrase;
pub mod rawkey;

pub use chain::TokenChain;
pub use phrase::{FileScanOutcome, PhraseScanner};
pub use rawkey::RawKeyScanner;
