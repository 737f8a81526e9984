//! Shared collector state, handed to every thread via `Arc`

use std::sync::Mutex;

use fslatency_core::NameRegistry;

use crate::config::Config;
use crate::globalstat::GlobalStatCell;
use crate::globalstatus::GlobalStatus;
use crate::status::StatusDb;

pub struct CollectorState {
    pub config: Config,
    pub registry: NameRegistry,
    pub statusdb: StatusDb,
    /// Serializes operations that must mutate the registry and a status
    /// entry together (client add, client forget).
    pub addremove_lock: Mutex<()>,
    pub alarmstatus: GlobalStatus,
    pub stat: GlobalStatCell,
}

impl CollectorState {
    pub fn new(config: Config) -> Result<Self, fslatency_core::RegistryError> {
        let registry = NameRegistry::new(
            config.maxclient,
            fslatency_core::wire::HOSTNAME_LEN + fslatency_core::wire::TEXT_LEN,
        )?;
        let statusdb = StatusDb::new(config.maxclient, config.rollingwindow);
        Ok(Self {
            registry,
            statusdb,
            addremove_lock: Mutex::new(()),
            alarmstatus: GlobalStatus::new(),
            stat: GlobalStatCell::new(),
            config,
        })
    }
}
