pub mod snapshot;
pub mod synthetic;

use std::{path::Path, sync::Arc};

use crate::{
    error::{FreezeOutError, Result},
    hydro::eos::{conformal::Conformal, table::Tabulated, EOSs, EquationOfState},
};

pub type SharedEos = Arc<dyn EquationOfState + Send + Sync>;

pub fn load_eos(eos: EOSs, table: Option<&Path>) -> Result<SharedEos> {
    match eos {
        EOSs::Conformal => Ok(Arc::new(Conformal::qgp())),
        EOSs::Table => {
            let path = table.ok_or_else(|| {
                FreezeOutError::InvalidConfig(
                    "the tabulated equation of state needs --eos-table".to_string(),
                )
            })?;
            Ok(Arc::new(Tabulated::from_file(path)?))
        }
    }
}
