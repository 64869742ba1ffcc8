pub mod checkout;
pub mod draft;
pub mod lookup;
pub mod manager;
pub mod mock;
pub mod models;
pub mod notification;
pub mod orchestrator;
pub mod persistence;
pub mod roster;
pub mod saved;

#[cfg(test)]
mod testing;

pub use checkout::{Checkout, CheckoutError, CheckoutSettings, Confirmation};
pub use draft::DraftError;
pub use lookup::{BookingLookup, LookupError};
pub use manager::{DraftManager, ManagerError};
pub use models::{BookingDraft, BookingFormat, DraftKind, DraftStage, PassengerCategory};
pub use notification::{Notifier, NotifyOutcome};
pub use orchestrator::{PaymentError, PaymentOrchestrator, PaymentRedirect, VerificationOutcome};
pub use persistence::BookingPersister;
pub use roster::{PassengerField, PassengerRoster, RosterError};
pub use saved::{SavedBooking, SavedBookings, SavedError};
