use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub display_text: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_text: id.clone(),
            id,
        }
    }

    pub fn avatar_url(&self) -> String {
        format!("/user/{}/avatar.png", urlencoding::encode(&self.id))
    }
}

/// Issue-order stamp of a lookup. Later tickets always compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LookupTicket(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupRequest {
    pub ticket: LookupTicket,
    /// `None` asks for the unfiltered list.
    pub prefix: Option<String>,
}

/// Keeps "last issued wins". A response is applied only while its ticket is
/// still the current one, whatever order responses arrive in. The counter is
/// never reset, so tickets from an earlier session can't match a later one.
#[derive(Clone, Debug, Default)]
pub struct LookupSequencer {
    issued: u64,
    current: Option<LookupTicket>,
}

impl LookupSequencer {
    pub fn issue(&mut self, prefix: Option<String>) -> LookupRequest {
        self.issued += 1;
        let ticket = LookupTicket(self.issued);
        self.current = Some(ticket);
        LookupRequest { ticket, prefix }
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        self.current == Some(ticket)
    }

    pub fn cancel(&mut self) {
        self.current = None;
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LookupBody {
    Names(Vec<Option<String>>),
    Other(serde_json::Value),
}

/// Turns a `/lookup` body into candidates. Anything that isn't a JSON array
/// of strings yields no candidates.
pub fn parse_lookup_body(body: &str) -> Vec<Candidate> {
    match serde_json::from_str::<LookupBody>(body) {
        Ok(LookupBody::Names(names)) => names
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .map(Candidate::new)
            .collect(),
        Ok(LookupBody::Other(value)) => {
            tracing::warn!(kind = json_kind(&value), "unexpected lookup response shape");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(%err, "malformed lookup response");
            Vec::new()
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
