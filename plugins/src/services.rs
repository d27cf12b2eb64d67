//! `ServicesFactory` implementation: builds transport, drafter and scorer from
//! config for the CLI.
use sshprobe_core::api::{AppConfig, CoreError, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

impl ServicesFactory for PluginServicesFactory {
    fn build_services(&self, cfg: &AppConfig) -> Result<Services, CoreError> {
        let transport = factory::build_transport(cfg);
        let drafter = factory::build_drafter(cfg).map_err(CoreError::Plugin)?;
        let scorer = factory::build_scorer(cfg).map_err(CoreError::Plugin)?;
        Ok(Services {
            transport,
            drafter,
            scorer,
        })
    }
}
