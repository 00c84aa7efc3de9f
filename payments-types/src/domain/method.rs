//! Payment instruments.
//!
//! Instruments are immutable value objects built by the caller per request.
//! Their `Debug` output never contains full card, CVV or account numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a card draws on credit or on a deposit account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFunding {
    #[default]
    Credit,
    Debit,
}

/// A payment card as entered by the cardholder.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    number: String,
    expiry: String,
    cvv: String,
    holder_name: String,
    #[serde(default)]
    funding: CardFunding,
}

impl CreditCard {
    /// Creates a credit-funded card. `expiry` is expected as `MM/YY`.
    pub fn new(
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
        holder_name: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
            holder_name: holder_name.into(),
            funding: CardFunding::Credit,
        }
    }

    /// Returns the same card with a different funding type.
    pub fn with_funding(mut self, funding: CardFunding) -> Self {
        self.funding = funding;
        self
    }

    /// The number exactly as entered.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// The number with spaces and hyphens removed.
    pub fn normalized_number(&self) -> String {
        self.number
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect()
    }

    /// Trailing four characters of the normalized number, for logs and receipts.
    pub fn last_four(&self) -> String {
        let normalized = self.normalized_number();
        let skip = normalized.chars().count().saturating_sub(4);
        normalized.chars().skip(skip).collect()
    }

    pub fn expiry(&self) -> &str {
        &self.expiry
    }

    pub fn cvv(&self) -> &str {
        &self.cvv
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn funding(&self) -> CardFunding {
        self.funding
    }
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("number", &format_args!("****{}", self.last_four()))
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .field("holder_name", &self.holder_name)
            .field("funding", &self.funding)
            .finish()
    }
}

/// A bank account reachable over the domestic bank rail.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    account_number: String,
    routing_number: String,
    account_name: String,
}

impl BankAccount {
    pub fn new(
        account_number: impl Into<String>,
        routing_number: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            routing_number: routing_number.into(),
            account_name: account_name.into(),
        }
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn routing_number(&self) -> &str {
        &self.routing_number
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }
}

impl fmt::Debug for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankAccount")
            .field("account_number", &"[redacted]")
            .field("routing_number", &self.routing_number)
            .field("account_name", &self.account_name)
            .finish()
    }
}

/// A PayPal wallet identified by its login email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPalAccount {
    email: String,
}

impl PayPalAccount {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// The closed set of instruments the engine can settle against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard(CreditCard),
    BankAccount(BankAccount),
    #[serde(rename = "paypal")]
    PayPal(PayPalAccount),
}

impl PaymentMethod {
    /// The kind used for fee lookup and logging.
    pub fn kind(&self) -> MethodKind {
        match self {
            PaymentMethod::CreditCard(card) => match card.funding() {
                CardFunding::Credit => MethodKind::CreditCard,
                CardFunding::Debit => MethodKind::DebitCard,
            },
            PaymentMethod::BankAccount(_) => MethodKind::BankAccount,
            PaymentMethod::PayPal(_) => MethodKind::PayPal,
        }
    }
}

impl From<CreditCard> for PaymentMethod {
    fn from(card: CreditCard) -> Self {
        PaymentMethod::CreditCard(card)
    }
}

impl From<BankAccount> for PaymentMethod {
    fn from(account: BankAccount) -> Self {
        PaymentMethod::BankAccount(account)
    }
}

impl From<PayPalAccount> for PaymentMethod {
    fn from(account: PayPalAccount) -> Self {
        PaymentMethod::PayPal(account)
    }
}

/// Instrument kinds as priced by a fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    CreditCard,
    DebitCard,
    BankAccount,
    #[serde(rename = "paypal")]
    PayPal,
}

impl MethodKind {
    /// Every declared kind, in schedule order.
    pub const ALL: [MethodKind; 4] = [
        MethodKind::CreditCard,
        MethodKind::DebitCard,
        MethodKind::BankAccount,
        MethodKind::PayPal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::CreditCard => "credit_card",
            MethodKind::DebitCard => "debit_card",
            MethodKind::BankAccount => "bank_account",
            MethodKind::PayPal => "paypal",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
