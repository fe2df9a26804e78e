//! Protocol state vocabularies reported by the agent runtime.
//!
//! The wire names follow the Aries RFC spelling (`request-received`,
//! `completed`, ...), which is what the runtime stores on its records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// DID exchange (RFC 0023) state of a connection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DidExchangeState {
    Start,
    InvitationSent,
    InvitationReceived,
    RequestSent,
    RequestReceived,
    ResponseSent,
    ResponseReceived,
    Abandoned,
    Completed,
}

impl DidExchangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::InvitationSent => "invitation-sent",
            Self::InvitationReceived => "invitation-received",
            Self::RequestSent => "request-sent",
            Self::RequestReceived => "request-received",
            Self::ResponseSent => "response-sent",
            Self::ResponseReceived => "response-received",
            Self::Abandoned => "abandoned",
            Self::Completed => "completed",
        }
    }

    /// The only state the workflow acts upon.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for DidExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the DID exchange this agent played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidExchangeRole {
    Requester,
    Responder,
}

impl DidExchangeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requester => "requester",
            Self::Responder => "responder",
        }
    }
}

impl fmt::Display for DidExchangeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue-credential (RFC 0453) state of a credential exchange record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialState {
    ProposalSent,
    ProposalReceived,
    OfferSent,
    OfferReceived,
    Declined,
    RequestSent,
    RequestReceived,
    CredentialIssued,
    CredentialReceived,
    Done,
    Abandoned,
}

impl CredentialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposalSent => "proposal-sent",
            Self::ProposalReceived => "proposal-received",
            Self::OfferSent => "offer-sent",
            Self::OfferReceived => "offer-received",
            Self::Declined => "declined",
            Self::RequestSent => "request-sent",
            Self::RequestReceived => "request-received",
            Self::CredentialIssued => "credential-issued",
            Self::CredentialReceived => "credential-received",
            Self::Done => "done",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an out-of-band record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutOfBandState {
    AwaitResponse,
    PrepareResponse,
    Done,
}

/// Role of the agent in an out-of-band exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfBandRole {
    Sender,
    Receiver,
}
