use crate::core::errors::{Error, Result};
use crate::firewall::api::{AliasApi, AliasDefinition, AliasLookup};
use ipnetwork::IpNetwork;
use log::{debug, error, info};
use std::collections::BTreeSet;
use std::fmt;

/*-------------------------------------------------------------------------------------------------
  Outcome
-------------------------------------------------------------------------------------------------*/

/// Terminal state of an alias reconciliation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The alias did not exist; it was created and applied.
    Created,
    /// The alias existed with different members; it was updated and applied.
    Updated,
    /// The alias already held exactly the desired members; nothing was written.
    Unchanged,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Updated => write!(f, "updated"),
            Outcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Reconcile
-------------------------------------------------------------------------------------------------*/

/// Make the firewall alias `name` hold exactly the `desired` ranges.
///
/// An absent alias is created; an alias whose members differ (compared as sets) is updated; an
/// alias that already matches is left alone and no write or reconfigure call is made. After a
/// create or update the firewall is asked to apply the change; a failure at that point is reported
/// as [Error::Apply].
pub fn reconcile<A: AliasApi + ?Sized>(
    api: &A,
    name: &str,
    desired: &[IpNetwork],
) -> Result<Outcome> {
    debug!("Updating firewall alias");

    let alias = AliasDefinition {
        name: name.to_string(),
        content: desired.iter().map(|range| range.to_string()).collect(),
    };

    let (outcome, result, endpoint) = match api.lookup(name)? {
        AliasLookup::NotFound => {
            debug!("Alias '{}' does not exist, creating it.", name);
            (Outcome::Created, api.add(&alias)?, "alias/addItem/".to_string())
        }
        AliasLookup::Found(uuid) => {
            let current = membership(api.get_content(&uuid)?.iter().map(String::as_str));
            let wanted = membership(alias.content.iter().map(String::as_str));

            if current == wanted {
                info!(
                    "Alias '{}' already contains the {} computed CIDR blocks; nothing to do.",
                    name,
                    alias.content.len()
                );
                return Ok(Outcome::Unchanged);
            }

            debug!(
                "Alias '{}' already exists, updating it ({} added, {} removed).",
                name,
                wanted.difference(&current).count(),
                current.difference(&wanted).count()
            );
            let endpoint = format!("alias/setItem/{uuid}");
            (Outcome::Updated, api.set(&uuid, &alias)?, endpoint)
        }
    };

    if !result.ok {
        let action = match outcome {
            Outcome::Created => "create",
            _ => "update",
        };
        error!(
            "Failed to {} alias '{}'. API Response: {}",
            action, name, result.message
        );
        return Err(Error::ApiResponse {
            endpoint,
            message: result.message,
        });
    }

    debug!("Applying alias changes.");
    apply(api, name)?;

    info!(
        "Alias '{}' {} with {} CIDR blocks.",
        name,
        outcome,
        alias.content.len()
    );
    Ok(outcome)
}

/// Ask the firewall to activate pending alias changes.
fn apply<A: AliasApi + ?Sized>(api: &A, name: &str) -> Result<()> {
    let wrap = |source: Error| Error::Apply {
        alias: name.to_string(),
        source: Box::new(source),
    };

    let result = api.reconfigure().map_err(wrap)?;
    if result.ok {
        Ok(())
    } else {
        let error = wrap(Error::ApiResponse {
            endpoint: "alias/reconfigure".to_string(),
            message: result.message,
        });
        error!("{}", error);
        Err(error)
    }
}

/// Canonical member set used to compare alias content regardless of order or CIDR spelling.
fn membership<'v, I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'v str>,
{
    values
        .into_iter()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| match value.parse::<IpNetwork>() {
            Ok(network) => crate::core::utils::ipnetwork::canonical(&network).to_string(),
            Err(_) => value.to_string(),
        })
        .collect()
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
