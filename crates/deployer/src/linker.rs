use std::collections::BTreeMap;

use dromos_types::{Address, TableError, UnitDescriptor, UnitName, Value};

use crate::{DeployError, ExecutionEnvironment};

/// Deploys shared library units and remembers their addresses.
///
/// A library is constructed at most once per run: repeated link requests for
/// the same unit return the recorded address without another deployment.
#[derive(Debug, Default)]
pub struct LibraryLinker {
    cache: BTreeMap<UnitName, Address>,
}

impl LibraryLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `descriptor` is deployed, constructing it on first request.
    pub async fn link<E: ExecutionEnvironment>(
        &mut self,
        env: &E,
        descriptor: &UnitDescriptor,
        args: &[Value],
        gas_ceiling: u64,
    ) -> Result<Address, DeployError> {
        if let Some(address) = self.cache.get(&descriptor.name) {
            tracing::debug!(
                library = %descriptor.name,
                address = %address,
                "Library already linked"
            );
            return Ok(address.clone());
        }

        let address = env
            .construct(&descriptor.type_name, &BTreeMap::new(), args, gas_ceiling)
            .await
            .map_err(|source| DeployError::ConstructionFailed {
                unit: descriptor.name.clone(),
                type_name: descriptor.type_name.clone(),
                source,
            })?;

        tracing::info!(
            library = %descriptor.name,
            type_name = %descriptor.type_name,
            address = %address,
            "Library deployed"
        );
        self.cache.insert(descriptor.name.clone(), address.clone());
        Ok(address)
    }

    /// Addresses for a set of already-linked libraries.
    pub fn link_addresses<'a>(
        &self,
        names: impl IntoIterator<Item = &'a UnitName>,
    ) -> Result<BTreeMap<UnitName, Address>, TableError> {
        names
            .into_iter()
            .map(|name| {
                self.cache
                    .get(name)
                    .map(|address| (name.clone(), address.clone()))
                    .ok_or_else(|| TableError::UnknownUnit(name.clone()))
            })
            .collect()
    }

    pub fn is_linked(&self, name: &UnitName) -> bool {
        self.cache.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use crate::EnvironmentError;

    #[derive(Clone, Default)]
    struct CountingEnvironment {
        constructions: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ExecutionEnvironment for CountingEnvironment {
        async fn construct(
            &self,
            type_name: &str,
            _libraries: &BTreeMap<String, Address>,
            _args: &[Value],
            _gas_ceiling: u64,
        ) -> Result<Address, EnvironmentError> {
            let mut constructions = self.constructions.lock().unwrap();
            constructions.push(type_name.to_string());
            Ok(Address::new(format!("0x{:02x}", constructions.len())))
        }

        async fn call(
            &self,
            _target: &Address,
            _method: &str,
            _args: &[Value],
            _gas_ceiling: u64,
        ) -> Result<(), EnvironmentError> {
            unimplemented!()
        }

        async fn read(
            &self,
            _target: &Address,
            _method: &str,
            _args: &[Value],
        ) -> Result<Value, EnvironmentError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_second_link_reuses_first_deployment() {
        let env = CountingEnvironment::default();
        let mut linker = LibraryLinker::new();
        let lib = UnitDescriptor::library("balanceLib", "BalanceLogicLibrary");

        let first = linker.link(&env, &lib, &[], 5_000_000).await.unwrap();
        let second = linker.link(&env, &lib, &[], 5_000_000).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(env.constructions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_link_addresses_returns_cached_entries() {
        let env = CountingEnvironment::default();
        let mut linker = LibraryLinker::new();
        let trig = UnitDescriptor::library("trig", "Trig");
        let perlin = UnitDescriptor::library("perlinNoise", "PerlinNoise");

        linker.link(&env, &trig, &[], 5_000_000).await.unwrap();
        linker.link(&env, &perlin, &[], 5_000_000).await.unwrap();

        let trig_name = UnitName::from("trig");
        let perlin_name = UnitName::from("perlinNoise");
        let addresses = linker
            .link_addresses([&trig_name, &perlin_name])
            .unwrap();
        assert_eq!(addresses.len(), 2);
        assert!(linker.is_linked(&trig_name));
    }

    #[tokio::test]
    async fn test_unlinked_library_lookup_fails() {
        let linker = LibraryLinker::new();
        let name = UnitName::from("ghost");
        assert!(linker.link_addresses([&name]).is_err());
    }
}
