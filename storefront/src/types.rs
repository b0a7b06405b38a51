//! Domain value types shared by the storefront state machines.

use boletera_api::Session;
use boletera_api::TicketStatus;
use serde::{Deserialize, Serialize};

/// Identifier of a raffle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RaffleId(i64);

/// Identifier of a purchase (a reservation binding numbers to a buyer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(i64);

/// Identifier of a payment awaiting organizer verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(i64);

macro_rules! id_impl {
    ($name:ident) => {
        impl $name {
            /// Wrap a raw backend identifier.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// The raw backend identifier.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_impl!(RaffleId);
id_impl!(PurchaseId);
id_impl!(PaymentId);

/// Exact money amount in centavos.
///
/// The backend serializes prices as decimal strings (`"50.00"`); this type
/// keeps them in exact integer units so running totals never accumulate
/// floating-point error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// From an amount in centavos.
    #[must_use]
    pub const fn from_centavos(centavos: u64) -> Self {
        Self(centavos)
    }

    /// From a whole-peso amount.
    #[must_use]
    pub const fn from_pesos(pesos: u64) -> Self {
        Self(pesos * 100)
    }

    /// Parse a backend decimal string (`"50"`, `"50.5"`, `"50.00"`).
    ///
    /// Fractions beyond two digits are truncated; anything non-numeric
    /// yields `None`.
    #[must_use]
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let text = text.trim();
        let (whole, frac) = match text.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (text, ""),
        };

        let pesos: u64 = whole.parse().ok()?;

        let frac: String = frac.chars().take(2).collect();
        let centavos = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().ok()? * 10,
            _ => frac.parse::<u64>().ok()?,
        };

        Some(Self(pesos.checked_mul(100)?.checked_add(centavos)?))
    }

    /// The amount in centavos.
    #[must_use]
    pub const fn centavos(self) -> u64 {
        self.0
    }

    /// Multiply by a count of numbers, saturating at the representable max.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn times(self, count: usize) -> Self {
        Self(self.0.saturating_mul(count as u64))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Identity fields a guest supplies when reserving numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestIdentity {
    /// Guest name
    pub name: String,
    /// Guest email
    pub email: String,
    /// Guest phone, also the lightweight guest-auth token
    pub phone: String,
}

impl GuestIdentity {
    /// Whether every required field is present (non-blank).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && !self.phone.trim().is_empty()
    }
}

/// Which rendering/query strategy the client runs under.
///
/// An explicit value passed to whichever component needs it, never derived
/// from ambient storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    /// Unauthenticated storefront visitor
    Visitor,
    /// Authenticated organizer carrying a bearer session
    Organizer(Session),
}

impl ViewMode {
    /// The organizer session, when present.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Visitor => None,
            Self::Organizer(session) => Some(session),
        }
    }

    /// Whether organizer-only operations are available.
    #[must_use]
    pub const fn is_organizer(&self) -> bool {
        matches!(self, Self::Organizer(_))
    }
}

/// One number the current guest holds in a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedTicket {
    /// The ticket number
    pub number: u32,
    /// Current status of this number
    pub status: TicketStatus,
    /// Unit price, when the backend reported one
    pub unit_price: Option<Money>,
}

/// A payment-proof image staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Original filename
    pub filename: String,
    /// MIME type
    pub content_type: String,
}
