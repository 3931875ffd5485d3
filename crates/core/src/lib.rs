pub mod money;
pub mod normalize;
pub mod period;
pub mod transaction;

pub use money::Money;
pub use normalize::{fold, normalize, resolve_aliases};
pub use period::{Granularity, PeriodKey};
pub use transaction::{CategorizedTransaction, CategoryPair, Transaction, UNCATEGORIZED};
