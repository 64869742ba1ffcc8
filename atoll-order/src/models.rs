use atoll_core::booking::PaymentReference;
use atoll_core::timeslot::TimeSlot;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roster::PassengerRoster;

/// Where a draft is in the select -> passengers -> payment -> confirmation flow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStage {
    SelectTrip,
    PassengerDetails,
    Payment,
    Confirmed,
}

/// Booking format; decides roster capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingFormat {
    Ferry,
    Activity,
}

impl BookingFormat {
    pub fn max_passengers(&self) -> usize {
        match self {
            BookingFormat::Ferry => 15,
            BookingFormat::Activity => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassengerCounts {
    pub adults: u32,
    pub children: u32,
    pub seniors: u32,
}

impl PassengerCounts {
    pub fn total(&self) -> u32 {
        self.adults
            .saturating_add(self.children)
            .saturating_add(self.seniors)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PassengerCategory {
    Adults,
    Children,
    Seniors,
}

/// Return leg; endpoints mirror the outbound leg.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReturnTripDetails {
    pub from: String,
    pub to: String,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FerryTrip {
    pub from: String,
    pub to: String,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
    pub outbound_speedboat: Option<String>,
    pub return_speedboat: Option<String>,
    pub return_trip: bool,
    pub return_details: Option<ReturnTripDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivitySelection {
    pub activity: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DraftKind {
    Ferry(FerryTrip),
    Activity(ActivitySelection),
}

impl DraftKind {
    pub fn format(&self) -> BookingFormat {
        match self {
            DraftKind::Ferry(_) => BookingFormat::Ferry,
            DraftKind::Activity(_) => BookingFormat::Activity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    #[default]
    Idle,
    Creating,
    Redirected,
    Verifying,
    Confirmed,
    Failed,
}

/// Payment round-trip state kept with the draft so it survives the gateway redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentProgress {
    pub state: PaymentState,
    pub transaction_id: Option<String>,
    pub redirect_url: Option<String>,
    pub gateway_reference: Option<String>,
    pub failure: Option<String>,
}

/// An in-progress booking, held server-side across the four booking steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    pub id: Uuid,
    pub stage: DraftStage,
    pub kind: DraftKind,
    pub passenger_counts: PassengerCounts,
    pub seats: u32,
    pub roster: PassengerRoster,
    pub payment_reference: Option<PaymentReference>,
    pub payment: PaymentProgress,
    pub payment_complete: bool,
    pub booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingDraft {
    pub fn new(format: BookingFormat) -> Self {
        let now = Utc::now();
        let kind = match format {
            BookingFormat::Ferry => DraftKind::Ferry(FerryTrip::default()),
            BookingFormat::Activity => DraftKind::Activity(ActivitySelection::default()),
        };
        let passenger_counts = PassengerCounts {
            adults: 1,
            ..Default::default()
        };

        Self {
            id: Uuid::new_v4(),
            stage: DraftStage::SelectTrip,
            kind,
            seats: passenger_counts.total(),
            passenger_counts,
            roster: PassengerRoster::for_format(format),
            payment_reference: None,
            payment: PaymentProgress::default(),
            payment_complete: false,
            booking_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn format(&self) -> BookingFormat {
        self.kind.format()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
