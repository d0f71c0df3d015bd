//! Project-scoped translation state.

use std::collections::HashMap;
use indexmap::IndexMap;

/// Categories of generated names, each with its own counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempCategory {
    Payload,
    ClientResult,
    DbQuery,
    DbStream,
    DbSelect,
    DwOutput,
    EnricherFunction,
    AsyncFunction,
    VmReceiverFunction,
    DwMethod,
}

impl TempCategory {
    /// Renders the name for counter value `n`.
    fn name(self, n: usize) -> String {
        match self {
            TempCategory::Payload => format!("_payload{}_", n),
            TempCategory::ClientResult => format!("_clientResult{}_", n),
            TempCategory::DbQuery => format!("_dbQuery{}_", n),
            TempCategory::DbStream => format!("_dbStream{}_", n),
            TempCategory::DbSelect => format!("_dbSelect{}_", n),
            TempCategory::DwOutput => format!("_dwOutput{}_", n),
            TempCategory::EnricherFunction => format!("enricher{}", n),
            TempCategory::AsyncFunction => format!("async{}", n),
            TempCategory::VmReceiverFunction => format!("vmReceive{}", n),
            TempCategory::DwMethod => format!("dwMethod{}", n),
        }
    }
}

/// Receiver function generated for a VM path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub function_name: String,
    /// Whether an inbound flow provided the function body.
    pub defined: bool,
}

impl Receiver {
    /// Name of the worker that forwards payloads into this receiver.
    pub fn worker_name(&self) -> String {
        format!("{}Worker", self.function_name)
    }
}

/// State that lives for one whole project translation.
///
/// Tables are append-only and counters never reset, so every name generated
/// during a project is unique.
#[derive(Debug, Default)]
pub struct ProjectState {
    flow_vars: IndexMap<String, String>,
    session_vars: IndexMap<String, String>,
    counters: HashMap<TempCategory, usize>,
    receivers: IndexMap<String, Receiver>,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a flow variable; the first registration's type wins.
    pub fn register_flow_var(&mut self, name: &str, inferred: &str) -> String {
        self.flow_vars
            .entry(name.to_string())
            .or_insert_with(|| inferred.to_string())
            .clone()
    }

    /// Registers a session variable; the first registration's type wins.
    pub fn register_session_var(&mut self, name: &str, inferred: &str) -> String {
        self.session_vars
            .entry(name.to_string())
            .or_insert_with(|| inferred.to_string())
            .clone()
    }

    pub fn flow_var(&self, name: &str) -> Option<&str> {
        self.flow_vars.get(name).map(String::as_str)
    }

    pub fn session_var(&self, name: &str) -> Option<&str> {
        self.session_vars.get(name).map(String::as_str)
    }

    pub fn flow_vars(&self) -> &IndexMap<String, String> {
        &self.flow_vars
    }

    pub fn session_vars(&self) -> &IndexMap<String, String> {
        &self.session_vars
    }

    /// Returns a fresh name from `category`'s counter.
    pub fn next_temp(&mut self, category: TempCategory) -> String {
        bump(&mut self.counters, category)
    }

    /// Returns the receiver for `path`, creating it on first use.
    pub fn resolve_or_create_receiver(&mut self, path: &str) -> &Receiver {
        self.receiver_mut(path)
    }

    /// Marks the receiver for `path` as defined by an inbound flow and
    /// returns its function name.
    pub fn define_receiver(&mut self, path: &str) -> String {
        let receiver = self.receiver_mut(path);
        receiver.defined = true;
        receiver.function_name.clone()
    }

    fn receiver_mut(&mut self, path: &str) -> &mut Receiver {
        let counters = &mut self.counters;
        self.receivers.entry(path.to_string()).or_insert_with(|| {
            let function_name = bump(counters, TempCategory::VmReceiverFunction);
            tracing::debug!(path, function = %function_name, "created VM receiver");
            Receiver {
                function_name,
                defined: false,
            }
        })
    }

    /// Receivers referenced by an outbound endpoint but never defined.
    pub fn undefined_receivers(&self) -> impl Iterator<Item = (&str, &Receiver)> {
        self.receivers
            .iter()
            .filter(|(_, r)| !r.defined)
            .map(|(path, r)| (path.as_str(), r))
    }
}

fn bump(counters: &mut HashMap<TempCategory, usize>, category: TempCategory) -> String {
    let counter = counters.entry(category).or_insert(0);
    let name = category.name(*counter);
    *counter += 1;
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn first_registration_wins() {
        let mut state = ProjectState::new();
        assert_eq!(state.register_flow_var("x", "int"), "int");
        assert_eq!(state.register_flow_var("x", "string"), "int");
        assert_eq!(state.flow_var("x"), Some("int"));
        assert_eq!(state.flow_vars().len(), 1);
    }

    #[test]
    fn session_and_flow_tables_are_independent() {
        let mut state = ProjectState::new();
        state.register_flow_var("x", "int");
        assert_eq!(state.register_session_var("x", "boolean"), "boolean");
        assert!(state.session_var("y").is_none());
    }

    #[test]
    fn counters_are_independent_and_monotonic() {
        let mut state = ProjectState::new();
        assert_eq!(state.next_temp(TempCategory::Payload), "_payload0_");
        assert_eq!(state.next_temp(TempCategory::Payload), "_payload1_");
        assert_eq!(state.next_temp(TempCategory::DbQuery), "_dbQuery0_");
        assert_eq!(state.next_temp(TempCategory::EnricherFunction), "enricher0");
        assert_eq!(state.next_temp(TempCategory::Payload), "_payload2_");
    }

    #[test]
    fn generated_names_are_pairwise_unique() {
        let categories = [
            TempCategory::Payload,
            TempCategory::ClientResult,
            TempCategory::DbQuery,
            TempCategory::DbStream,
            TempCategory::DbSelect,
            TempCategory::DwOutput,
            TempCategory::EnricherFunction,
            TempCategory::AsyncFunction,
            TempCategory::VmReceiverFunction,
            TempCategory::DwMethod,
        ];
        let mut state = ProjectState::new();
        let mut seen = HashSet::new();
        for round in 0..5 {
            for category in categories {
                let name = state.next_temp(category);
                assert!(seen.insert(name.clone()), "duplicate {} in round {}", name, round);
            }
        }
    }

    #[test]
    fn receiver_is_memoized_per_path() {
        let mut state = ProjectState::new();
        let foo = state.resolve_or_create_receiver("/foo").function_name.clone();
        let foo_again = state.resolve_or_create_receiver("/foo").function_name.clone();
        let bar = state.resolve_or_create_receiver("/bar").function_name.clone();

        assert_eq!(foo, foo_again);
        assert_ne!(foo, bar);
    }

    #[test]
    fn tracks_undefined_receivers() {
        let mut state = ProjectState::new();
        state.resolve_or_create_receiver("/foo");
        state.resolve_or_create_receiver("/bar");
        assert_eq!(state.define_receiver("/foo"), "vmReceive0");

        let undefined: Vec<_> = state.undefined_receivers().map(|(p, _)| p).collect();
        assert_eq!(undefined, vec!["/bar"]);
    }
}
