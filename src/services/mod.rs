pub mod fees;
pub mod transfer;
pub mod withdrawal;

pub use fees::{FeeEstimator, FeeSchedule, FeeTier};
pub use transfer::TransferService;
pub use withdrawal::{Channel, WithdrawalService};
