//! Fragment machinery: selection specs, declared signatures, the shared
//! model cache and the insertion driver.

mod cache;
mod insert;
mod key;
mod selection;
mod signature;

pub use cache::{CacheStats, FragmentCache};
pub use insert::{FragmentInsertion, FragmentParser};
pub use key::FragmentKey;
pub use selection::{
    FragmentSelection, ProcessedSelection, parse_fragment_selection, process_fragment_selection,
};
pub use signature::{
    FragmentSignature, SignatureParameter, parse_fragment_signature, process_parameters,
};
