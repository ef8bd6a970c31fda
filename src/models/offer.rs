use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::AppError;

/// Lifecycle of an offer.
///
/// ```text
/// pending ──accept──▶ accepted ──request payment──▶ payment_pending ──confirm──▶ paid ──complete──▶ completed
///    │                   │                              ▲      │
///    ├──decline──▶ declined                             └──────┘ (request payment again)
///    └──cancel───▶ cancelled ◀──cancel── accepted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    PaymentPending,
    Paid,
    Completed,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
            OfferStatus::Cancelled => "cancelled",
            OfferStatus::PaymentPending => "payment_pending",
            OfferStatus::Paid => "paid",
            OfferStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OfferStatus::Pending),
            "accepted" => Some(OfferStatus::Accepted),
            "declined" => Some(OfferStatus::Declined),
            "cancelled" => Some(OfferStatus::Cancelled),
            "payment_pending" => Some(OfferStatus::PaymentPending),
            "paid" => Some(OfferStatus::Paid),
            "completed" => Some(OfferStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OfferStatus::Declined | OfferStatus::Cancelled | OfferStatus::Completed
        )
    }

    /// Payment has gone through; the job can be reviewed.
    pub fn is_settled(&self) -> bool {
        matches!(self, OfferStatus::Paid | OfferStatus::Completed)
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of an offer a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Client,
    Handyman,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferAction {
    Accept,
    Decline,
    Cancel,
    RequestPayment,
    ConfirmPayment,
    Complete,
}

impl OfferAction {
    pub fn allowed_from(&self) -> &'static [OfferStatus] {
        match self {
            OfferAction::Accept | OfferAction::Decline => &[OfferStatus::Pending],
            OfferAction::Cancel => &[OfferStatus::Pending, OfferStatus::Accepted],
            OfferAction::RequestPayment => &[OfferStatus::Accepted, OfferStatus::PaymentPending],
            OfferAction::ConfirmPayment => &[OfferStatus::PaymentPending],
            OfferAction::Complete => &[OfferStatus::Paid],
        }
    }

    pub fn target(&self) -> OfferStatus {
        match self {
            OfferAction::Accept => OfferStatus::Accepted,
            OfferAction::Decline => OfferStatus::Declined,
            OfferAction::Cancel => OfferStatus::Cancelled,
            OfferAction::RequestPayment => OfferStatus::PaymentPending,
            OfferAction::ConfirmPayment => OfferStatus::Paid,
            OfferAction::Complete => OfferStatus::Completed,
        }
    }

    pub fn actor(&self) -> Party {
        match self {
            OfferAction::Accept | OfferAction::Decline | OfferAction::Complete => Party::Handyman,
            OfferAction::Cancel | OfferAction::RequestPayment | OfferAction::ConfirmPayment => {
                Party::Client
            }
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            OfferAction::Accept => "accept",
            OfferAction::Decline => "decline",
            OfferAction::Cancel => "cancel",
            OfferAction::RequestPayment => "request payment for",
            OfferAction::ConfirmPayment => "confirm payment for",
            OfferAction::Complete => "complete",
        }
    }
}

/// Pure transition function of the offer state machine.
pub fn transition(from: OfferStatus, action: OfferAction) -> Result<OfferStatus, AppError> {
    if action.allowed_from().contains(&from) {
        Ok(action.target())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot {} an offer that is {}",
            action.verb(),
            from
        )))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub client_id: String,
    pub handyman_id: String,
    pub service_id: Option<String>,
    pub description: String,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub status: OfferStatus,
    pub payment_intent_id: Option<String>,
    pub scheduled_for: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub accepted_at: Option<i64>,
    pub paid_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl Offer {
    pub fn party_of(&self, user_id: &str) -> Option<Party> {
        if self.client_id == user_id {
            Some(Party::Client)
        } else if self.handyman_id == user_id {
            Some(Party::Handyman)
        } else {
            None
        }
    }

    /// The participant that should hear about an action taken by `actor`.
    pub fn counterpart(&self, actor: Party) -> &str {
        match actor {
            Party::Client => &self.handyman_id,
            Party::Handyman => &self.client_id,
        }
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOfferRequest {
    pub handyman_id: String,
    pub service_id: Option<String>,
    pub description: String,
    pub amount: i64,
    pub currency: Option<String>,
    pub scheduled_for: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OfferListQuery {
    pub status: Option<String>,
    /// `client` or `handyman`; both sides when omitted
    pub role: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OfferResponse {
    pub id: String,
    pub client_id: String,
    pub handyman_id: String,
    pub service_id: Option<String>,
    pub description: String,
    pub amount: i64,
    pub currency: String,
    pub status: OfferStatus,
    pub payment_intent_id: Option<String>,
    pub scheduled_for: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub accepted_at: Option<i64>,
    pub paid_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        OfferResponse {
            id: offer.id_hex(),
            client_id: offer.client_id,
            handyman_id: offer.handyman_id,
            service_id: offer.service_id,
            description: offer.description,
            amount: offer.amount,
            currency: offer.currency,
            status: offer.status,
            payment_intent_id: offer.payment_intent_id,
            scheduled_for: offer.scheduled_for,
            created_at: offer.created_at,
            updated_at: offer.updated_at,
            accepted_at: offer.accepted_at,
            paid_at: offer.paid_at,
            completed_at: offer.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OfferStatus; 7] = [
        OfferStatus::Pending,
        OfferStatus::Accepted,
        OfferStatus::Declined,
        OfferStatus::Cancelled,
        OfferStatus::PaymentPending,
        OfferStatus::Paid,
        OfferStatus::Completed,
    ];

    #[test]
    fn test_happy_path_lifecycle() {
        let mut status = OfferStatus::Pending;
        for action in [
            OfferAction::Accept,
            OfferAction::RequestPayment,
            OfferAction::ConfirmPayment,
            OfferAction::Complete,
        ] {
            status = transition(status, action).unwrap();
        }
        assert_eq!(status, OfferStatus::Completed);
    }

    #[test]
    fn test_payment_requires_acceptance() {
        let err = transition(OfferStatus::Pending, OfferAction::RequestPayment).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(transition(OfferStatus::Declined, OfferAction::RequestPayment).is_err());
    }

    #[test]
    fn test_payment_intent_can_be_requested_again() {
        assert_eq!(
            transition(OfferStatus::PaymentPending, OfferAction::RequestPayment).unwrap(),
            OfferStatus::PaymentPending
        );
    }

    #[test]
    fn test_confirm_only_from_payment_pending() {
        for status in ALL {
            let result = transition(status, OfferAction::ConfirmPayment);
            assert_eq!(result.is_ok(), status == OfferStatus::PaymentPending, "{}", status);
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let actions = [
            OfferAction::Accept,
            OfferAction::Decline,
            OfferAction::Cancel,
            OfferAction::RequestPayment,
            OfferAction::ConfirmPayment,
            OfferAction::Complete,
        ];
        for status in ALL.iter().filter(|s| s.is_terminal()) {
            for action in actions {
                assert!(transition(*status, action).is_err(), "{} / {:?}", status, action);
            }
        }
    }

    #[test]
    fn test_cancel_not_allowed_once_payment_started() {
        assert!(transition(OfferStatus::Accepted, OfferAction::Cancel).is_ok());
        assert!(transition(OfferStatus::PaymentPending, OfferAction::Cancel).is_err());
        assert!(transition(OfferStatus::Paid, OfferAction::Cancel).is_err());
    }

    #[test]
    fn test_actors() {
        assert_eq!(OfferAction::Accept.actor(), Party::Handyman);
        assert_eq!(OfferAction::Complete.actor(), Party::Handyman);
        assert_eq!(OfferAction::Cancel.actor(), Party::Client);
        assert_eq!(OfferAction::RequestPayment.actor(), Party::Client);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ALL {
            assert_eq!(OfferStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OfferStatus::parse("archived"), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&OfferStatus::PaymentPending).unwrap();
        assert_eq!(json, "\"payment_pending\"");
    }

    #[test]
    fn test_party_and_counterpart() {
        let offer = Offer {
            id: None,
            client_id: "client".into(),
            handyman_id: "handy".into(),
            service_id: None,
            description: "Fix sink".into(),
            amount: 5000,
            currency: "usd".into(),
            status: OfferStatus::Pending,
            payment_intent_id: None,
            scheduled_for: None,
            created_at: 0,
            updated_at: 0,
            accepted_at: None,
            paid_at: None,
            completed_at: None,
        };
        assert_eq!(offer.party_of("client"), Some(Party::Client));
        assert_eq!(offer.party_of("handy"), Some(Party::Handyman));
        assert_eq!(offer.party_of("someone"), None);
        assert_eq!(offer.counterpart(Party::Client), "handy");
        assert_eq!(offer.counterpart(Party::Handyman), "client");
    }
}
