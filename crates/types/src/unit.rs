use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Address, Amount, AddressTable, TableError, UnitName};

/// Fully resolved argument value, ready to hand to the execution
/// environment. Contains no references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Address(Address),
    Uint(Amount),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Value::Address(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<Amount> {
        match self {
            Value::Uint(amount) => Some(*amount),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Address(addr) => write!(f, "{addr}"),
            Value::Uint(amount) => write!(f, "{amount}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Plan-time argument: either a literal value or a reference to another
/// unit's eventual address. Lists may mix literals and references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    Address(Address),
    Uint(Amount),
    Bool(bool),
    Str(String),
    List(Vec<Arg>),
    Ref(UnitName),
}

impl Arg {
    pub fn address(raw: impl Into<Address>) -> Self {
        Arg::Address(raw.into())
    }

    pub fn uint(value: impl Into<Amount>) -> Self {
        Arg::Uint(value.into())
    }

    pub fn reference(name: impl Into<UnitName>) -> Self {
        Arg::Ref(name.into())
    }

    /// Resolve this argument against an address table, replacing every
    /// reference with the referenced unit's address.
    pub fn resolve(&self, table: &AddressTable) -> Result<Value, TableError> {
        match self {
            Arg::Address(addr) => Ok(Value::Address(addr.clone())),
            Arg::Uint(amount) => Ok(Value::Uint(*amount)),
            Arg::Bool(b) => Ok(Value::Bool(*b)),
            Arg::Str(s) => Ok(Value::Str(s.clone())),
            Arg::List(items) => items
                .iter()
                .map(|item| item.resolve(table))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Arg::Ref(name) => table.get(name).cloned().map(Value::Address),
        }
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a UnitName>) {
        match self {
            Arg::Ref(name) => out.push(name),
            Arg::List(items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            _ => {}
        }
    }
}

/// One post-deployment configuration call on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSpec {
    pub method: String,
    pub args: Vec<Arg>,
}

/// How a unit is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Regular contract, constructed directly.
    #[default]
    Contract,
    /// Shared library, deployed at most once per run through the linker and
    /// named by other units in their link slots.
    Library,
}

/// Declarative description of one deployable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub name: UnitName,
    pub type_name: String,
    #[serde(default)]
    pub kind: UnitKind,
    #[serde(default)]
    pub constructor_args: Vec<Arg>,
    /// Link slot name -> library unit name.
    #[serde(default)]
    pub libraries: BTreeMap<String, UnitName>,
    /// Explicit ordering edges beyond argument references.
    #[serde(default)]
    pub depends_on: Vec<UnitName>,
    #[serde(default)]
    pub post_deploy_calls: Vec<CallSpec>,
}

impl UnitDescriptor {
    pub fn contract(name: impl Into<UnitName>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            kind: UnitKind::Contract,
            constructor_args: Vec::new(),
            libraries: BTreeMap::new(),
            depends_on: Vec::new(),
            post_deploy_calls: Vec::new(),
        }
    }

    pub fn library(name: impl Into<UnitName>, type_name: impl Into<String>) -> Self {
        Self {
            kind: UnitKind::Library,
            ..Self::contract(name, type_name)
        }
    }

    pub fn constructor_arg(mut self, arg: Arg) -> Self {
        self.constructor_args.push(arg);
        self
    }

    pub fn link(mut self, slot: impl Into<String>, library: impl Into<UnitName>) -> Self {
        self.libraries.insert(slot.into(), library.into());
        self
    }

    pub fn depends_on(mut self, unit: impl Into<UnitName>) -> Self {
        self.depends_on.push(unit.into());
        self
    }

    pub fn post_deploy(mut self, method: impl Into<String>, args: Vec<Arg>) -> Self {
        self.post_deploy_calls.push(CallSpec {
            method: method.into(),
            args,
        });
        self
    }

    /// References that constrain construction order: constructor arguments,
    /// link slots, and explicit depends-on edges.
    pub fn construction_refs(&self) -> Vec<&UnitName> {
        let mut refs = Vec::new();
        for arg in &self.constructor_args {
            arg.collect_refs(&mut refs);
        }
        refs.extend(self.libraries.values());
        refs.extend(self.depends_on.iter());
        refs
    }

    /// Every reference the descriptor makes, including post-deploy call
    /// arguments. Post-deploy references resolve against the complete table
    /// and so do not constrain ordering, but they must still name something.
    pub fn all_refs(&self) -> Vec<&UnitName> {
        let mut refs = self.construction_refs();
        for call in &self.post_deploy_calls {
            for arg in &call.args {
                arg.collect_refs(&mut refs);
            }
        }
        refs
    }
}

/// A unit the executor has constructed. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedUnit {
    pub name: UnitName,
    pub type_name: String,
    pub address: Address,
    /// Logical sequence number within the run; strictly increasing along
    /// every reference edge.
    pub deployed_at: u64,
}
