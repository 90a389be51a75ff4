use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use crate::{
    accrual::{AccrualResolver, ResolverError},
    db_types::{AccrualReport, OrderNumber},
};

type Script = HashMap<String, VecDeque<Result<AccrualReport, ResolverError>>>;

/// An [`AccrualResolver`] that replays canned answers per order number.
///
/// Answers are consumed in the order they were queued. The last queued answer for a number is sticky, so a single
/// `PROCESSED` answer is returned on every subsequent tick, like a real resolver would. Orders with no script are
/// reported as `REGISTERED`. Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResolver {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, number: &str, answer: Result<AccrualReport, ResolverError>) -> &Self {
        self.script.lock().expect("script mutex").entry(number.to_string()).or_default().push_back(answer);
        self
    }

    /// Every order number that was looked up, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex").clone()
    }
}

impl AccrualResolver for ScriptedResolver {
    async fn resolve(&self, number: &OrderNumber) -> Result<AccrualReport, ResolverError> {
        self.calls.lock().expect("calls mutex").push(number.to_string());
        let mut script = self.script.lock().expect("script mutex");
        match script.get_mut(number.as_str()) {
            Some(answers) if answers.len() > 1 => answers.pop_front().expect("non-empty queue"),
            Some(answers) => answers.front().cloned().unwrap_or_else(|| Ok(AccrualReport::registered(number))),
            None => Ok(AccrualReport::registered(number)),
        }
    }
}
