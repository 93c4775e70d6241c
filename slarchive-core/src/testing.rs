use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::api::{Params, SlackApi, Verb};
use crate::error::{Result, SlarchiveError};
use crate::render::UserDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub verb: Verb,
    pub endpoint: String,
    pub params: Params,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
pub struct ScriptedApi {
    responses: RefCell<HashMap<String, VecDeque<String>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, endpoint: &str, body: &str) -> Self {
        self.responses
            .borrow_mut()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(body.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }
}

impl SlackApi for ScriptedApi {
    fn call(&self, verb: Verb, endpoint: &str, params: &Params, _body: &[u8]) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push(RecordedCall {
            verb,
            endpoint: endpoint.to_string(),
            params: params.clone(),
        });

        self.responses
            .borrow_mut()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
            .map(String::into_bytes)
            .ok_or_else(|| SlarchiveError::RemoteNotOk {
                endpoint: endpoint.to_string(),
                body: "no scripted response".to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub struct StubUsers {
    names: HashMap<String, String>,
    pub lookups: Vec<String>,
}

impl StubUsers {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            names: entries
                .iter()
                .map(|(id, name)| ((*id).to_string(), (*name).to_string()))
                .collect(),
            lookups: Vec::new(),
        }
    }
}

impl UserDirectory for StubUsers {
    fn username_for_id(&mut self, id: &str) -> Result<String> {
        self.lookups.push(id.to_string());
        self.names
            .get(id)
            .cloned()
            .ok_or_else(|| SlarchiveError::UserNotFound {
                id: id.to_string(),
                source: None,
            })
    }
}
