//! Post-restore database sanitization
//!
//! A restored database still points at production external systems: mail
//! servers, bank synchronisation, delivery carriers, social media tokens.
//! Each neutralization step below clears one of those integrations. Steps
//! are independent and idempotent; a step that fails (a table from an
//! uninstalled module, for instance) is logged and skipped, it never aborts
//! the rest of the set.

use postgres::Client;
use tracing::warn;

use crate::error::TenbackResult;

/// One named, best-effort sanitization statement set
pub struct NeutralizationStep {
    pub name: &'static str,
    sql: &'static str,
}

/// Outcome of one step; failures carry the database error text
pub struct StepOutcome {
    pub name: &'static str,
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The full neutralization catalog, in execution order
pub const STEPS: &[NeutralizationStep] = &[
    NeutralizationStep {
        name: "remove enterprise code and frozen URLs",
        sql: "DELETE FROM ir_config_parameter \
              WHERE key IN ('database.enterprise_code', 'report.url', 'web.base.url.freeze');",
    },
    NeutralizationStep {
        name: "reset database uuid",
        sql: "UPDATE ir_config_parameter SET value = (SELECT gen_random_uuid()) \
              WHERE key = 'database.uuid';",
    },
    NeutralizationStep {
        name: "refresh expiration date",
        sql: "INSERT INTO ir_config_parameter \
              (key, value, create_uid, create_date, write_uid, write_date) VALUES \
              ('database.expiration_date', \
               (current_date + '3 months'::interval)::timestamp, 1, \
               current_timestamp, 1, current_timestamp) \
              ON CONFLICT (key) \
              DO UPDATE SET value = (current_date + '3 months'::interval)::timestamp;",
    },
    NeutralizationStep {
        name: "disable bank synchronisation links",
        sql: "UPDATE account_online_link SET provider_data = '', client_id = 'duplicate';",
    },
    NeutralizationStep {
        name: "deactivate fetchmail servers",
        sql: "UPDATE fetchmail_server SET active = false;",
    },
    NeutralizationStep {
        name: "deactivate mail servers",
        sql: "DO $$
              BEGIN
                  UPDATE ir_mail_server SET active = 'f';
                  IF EXISTS (SELECT 1 FROM ir_module_module WHERE name = 'mail' \
                             AND state IN ('installed', 'to upgrade', 'to remove')) THEN
                      UPDATE mail_template SET mail_server_id = NULL;
                  END IF;
              EXCEPTION
                  WHEN undefined_table OR undefined_column THEN
              END;
              $$;",
    },
    NeutralizationStep {
        name: "deactivate crons",
        sql: "UPDATE ir_cron SET active = 'f';
              UPDATE ir_cron SET active = 't' WHERE id IN \
              (SELECT res_id FROM ir_model_data \
               WHERE name = 'autovacuum_job' AND module = 'base');
              UPDATE ir_cron SET active = 't' WHERE id IN \
              (SELECT res_id FROM ir_model_data \
               WHERE name = 'ir_cron_module_update_notification' AND module = 'mail');",
    },
    NeutralizationStep {
        name: "remove platform logging",
        sql: "DELETE FROM ir_logging WHERE func = 'odoo.sh';",
    },
    NeutralizationStep {
        name: "disable delivery carriers",
        sql: "UPDATE delivery_carrier SET prod_environment = false;
              UPDATE delivery_carrier SET active = false \
              WHERE delivery_type NOT IN ('fixed', 'base_on_rule');",
    },
    NeutralizationStep {
        name: "disable iap account",
        sql: "UPDATE iap_account \
              SET account_token = REGEXP_REPLACE(account_token, '(\\+.*)?$', '+disabled');",
    },
    NeutralizationStep {
        name: "detach mail templates",
        sql: "UPDATE mail_template SET mail_server_id = NULL;",
    },
    NeutralizationStep {
        name: "disable payment providers",
        sql: "UPDATE payment_provider SET state = 'disabled' \
              WHERE state NOT IN ('test', 'disabled');",
    },
    NeutralizationStep {
        name: "clear website domains",
        sql: "UPDATE website SET domain = NULL;",
    },
    NeutralizationStep {
        name: "disable cdn",
        sql: "UPDATE website SET cdn_activated = false;",
    },
    NeutralizationStep {
        name: "delete ocn identifiers",
        sql: "DELETE FROM ir_config_parameter \
              WHERE key IN ('odoo_ocn.project_id', 'ocn.uuid');",
    },
    NeutralizationStep {
        name: "clear facebook tokens",
        sql: "UPDATE social_account \
              SET facebook_account_id = NULL, facebook_access_token = NULL;",
    },
    NeutralizationStep {
        name: "clear instagram tokens",
        sql: "UPDATE social_account SET instagram_account_id = NULL, \
              instagram_facebook_account_id = NULL, instagram_access_token = NULL;",
    },
    NeutralizationStep {
        name: "clear linkedin tokens",
        sql: "UPDATE social_account \
              SET linkedin_account_urn = NULL, linkedin_access_token = NULL;",
    },
    NeutralizationStep {
        name: "clear twitter tokens",
        sql: "UPDATE social_account SET twitter_user_id = NULL, \
              twitter_oauth_token = NULL, twitter_oauth_token_secret = NULL;",
    },
    NeutralizationStep {
        name: "clear youtube tokens",
        sql: "UPDATE social_account SET youtube_channel_id = NULL, \
              youtube_access_token = NULL, youtube_refresh_token = NULL, \
              youtube_token_expiration_date = NULL, youtube_upload_playlist_id = NULL;",
    },
    NeutralizationStep {
        name: "unset firebase configuration",
        sql: "UPDATE website SET firebase_enable_push_notifications = false, \
              firebase_use_own_account = false, firebase_project_id = NULL, \
              firebase_web_api_key = NULL, firebase_push_certificate_key = NULL, \
              firebase_sender_id = NULL;",
    },
    NeutralizationStep {
        name: "remove mapbox token",
        sql: "DELETE FROM ir_config_parameter WHERE key = 'web_map.token_map_box';",
    },
];

/// Run every step against the restored database. Failures are recorded and
/// logged per step; the set always runs to the end.
pub fn run_all(client: &mut Client) -> Vec<StepOutcome> {
    STEPS
        .iter()
        .map(|step| {
            let error = client.batch_execute(step.sql).err().map(|e| e.to_string());
            if let Some(err) = &error {
                warn!(step = step.name, error = %err, "neutralization step failed");
            }
            StepOutcome {
                name: step.name,
                error,
            }
        })
        .collect()
}

/// Copy handling: the restored database is an independent copy, so give it
/// a fresh identity and drop the license binding. Unlike the neutralization
/// set, a failure here is fatal.
pub fn reset_identity(client: &mut Client) -> TenbackResult<()> {
    client.batch_execute(
        "DELETE FROM ir_config_parameter \
         WHERE key IN ('database.enterprise_code', 'report.url', 'web.base.url.freeze');",
    )?;
    client.batch_execute(
        "UPDATE ir_config_parameter SET value = (SELECT gen_random_uuid()) \
         WHERE key = 'database.uuid';",
    )?;
    client.batch_execute(
        "INSERT INTO ir_config_parameter \
         (key, value, create_uid, create_date, write_uid, write_date) VALUES \
         ('database.expiration_date', \
          (current_date + '3 months'::interval)::timestamp, 1, \
          current_timestamp, 1, current_timestamp) \
         ON CONFLICT (key) \
         DO UPDATE SET value = (current_date + '3 months'::interval)::timestamp;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_step_names_are_unique() {
        let names: HashSet<_> = STEPS.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), STEPS.len());
    }

    #[test]
    fn test_catalog_covers_known_integrations() {
        let all_sql: String = STEPS.iter().map(|s| s.sql).collect();
        for table in [
            "ir_config_parameter",
            "ir_mail_server",
            "ir_cron",
            "fetchmail_server",
            "delivery_carrier",
            "payment_provider",
            "social_account",
            "website",
            "iap_account",
        ] {
            assert!(all_sql.contains(table), "no step touches {}", table);
        }
    }
}
