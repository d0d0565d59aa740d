//! Terminal dialogs, the `Dialogs` implementation used by the binary.

use std::path::Path;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, Stdin, Stdout};

use super::{Dialogs, Messages, PrivateKeySource, Prompt, RetirementChoice};
use crate::actions::ActionKind;
use crate::config::NetworkInfo;
use crate::crypto;
use crate::error::{DialogError, ValidationError};
use crate::gateway::WhitelistEntry;
use crate::phases::manual_submission::Submission;
use crate::state::NodeRole;
use crate::state::validation;

/// Dialogs rendered through a line prompt.
pub struct TerminalDialogs<R, W> {
    prompt: Prompt<R, W>,
    messages: Messages,
}

impl TerminalDialogs<BufReader<Stdin>, Stdout> {
    /// Dialogs on the process's stdin/stdout.
    pub fn stdio(messages: Messages) -> Self {
        Self::new(
            Prompt::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout()),
            messages,
        )
    }
}

impl<R, W> TerminalDialogs<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(prompt: Prompt<R, W>, messages: Messages) -> Self {
        Self { prompt, messages }
    }
}

#[async_trait]
impl<R, W> Dialogs for TerminalDialogs<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn docker_detected(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.docker_detected()).await
    }

    async fn docker_missing(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.docker_missing()).await
    }

    async fn ask_for_private_key(&self) -> Result<PrivateKeySource, DialogError> {
        let options = vec![
            (self.messages.private_key_generate(), true),
            (self.messages.private_key_manual(), false),
        ];
        let generate = self
            .prompt
            .choose(&self.messages.private_key_source(), &options)
            .await?;
        if generate {
            return Ok(PrivateKeySource::Generate);
        }
        let key = self
            .prompt
            .ask_until(&self.messages.private_key_input(), |raw| {
                let key = SecretString::from(raw);
                crypto::parse_private_key(&key)?;
                Ok(key)
            })
            .await?;
        Ok(PrivateKeySource::Manual(key))
    }

    async fn private_key_detected(&self, address: &str) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.private_key_detected(address))
            .await
    }

    async fn ask_for_network(&self, networks: &[NetworkInfo]) -> Result<NetworkInfo, DialogError> {
        let options: Vec<(String, NetworkInfo)> = networks
            .iter()
            .map(|n| (n.name.clone(), n.clone()))
            .collect();
        self.prompt
            .choose(&self.messages.network_question(), &options)
            .await
    }

    async fn network_selected(&self, network: &NetworkInfo) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.network_selected(&network.name))
            .await
    }

    async fn docker_restart_required(&self) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.docker_restart_required())
            .await
    }

    async fn accept_tos(&self, tos_text: &str) -> Result<String, DialogError> {
        self.prompt.say(&self.messages.tos_intro(tos_text)).await?;
        self.prompt
            .ask_until(&self.messages.tos_question(), |s| {
                validation::validate_tos_acceptance(s)?;
                Ok(s.to_string())
            })
            .await
    }

    async fn ask_for_node_type(&self) -> Result<NodeRole, DialogError> {
        let options: Vec<(String, NodeRole)> = NodeRole::ALL
            .iter()
            .map(|r| (self.messages.role_label(*r), *r))
            .collect();
        self.prompt
            .choose(&self.messages.node_type_question(), &options)
            .await
    }

    async fn ask_for_apollo_minimal_deposit(&self) -> Result<Decimal, DialogError> {
        self.prompt
            .ask_until(
                &self.messages.apollo_minimal_deposit_question(),
                validation::parse_amount,
            )
            .await
    }

    async fn role_selected(&self, role: NodeRole) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.role_selected(role)).await
    }

    async fn ask_for_node_url(&self) -> Result<String, DialogError> {
        self.prompt
            .ask_until(&self.messages.node_url_question(), |s| {
                validation::validate_url(s)?;
                Ok(s.to_string())
            })
            .await
    }

    async fn node_url_detected(&self, url: &str) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.node_url_detected(url)).await
    }

    async fn ask_for_node_ip(&self) -> Result<String, DialogError> {
        self.prompt
            .ask_until(&self.messages.node_ip_question(), |s| {
                validation::validate_ip(s)?;
                Ok(s.to_string())
            })
            .await
    }

    async fn node_ip_detected(&self, ip: &str) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.node_ip_detected(ip)).await
    }

    async fn ask_for_user_email(&self) -> Result<Option<String>, DialogError> {
        self.prompt
            .ask_until(&self.messages.user_email_question(), |s| {
                if s.is_empty() {
                    return Ok(None);
                }
                validation::validate_email(s)?;
                Ok(Some(s.to_string()))
            })
            .await
    }

    async fn user_email_detected(&self, email: &str) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.user_email_detected(email))
            .await
    }

    async fn invalid_input(&self, error: &ValidationError) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.invalid_input(&error.to_string()))
            .await
    }

    async fn address_whitelisted(&self, entry: &WhitelistEntry) -> Result<(), DialogError> {
        self.prompt
            .say(
                &self
                    .messages
                    .address_whitelisted(entry.role, entry.required_deposit),
            )
            .await
    }

    async fn address_not_whitelisted(&self, address: &str) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.address_not_whitelisted(address))
            .await
    }

    async fn display_submission(&self, submission: &Submission) -> Result<(), DialogError> {
        let body = serde_json::to_string_pretty(submission)
            .map_err(|e| DialogError::Io(std::io::Error::other(e)))?;
        self.prompt
            .say(&format!("{}\n{body}", self.messages.submission_header()))
            .await
    }

    async fn role_mismatch(&self, whitelisted: NodeRole, chosen: NodeRole) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.role_mismatch(whitelisted, chosen))
            .await
    }

    async fn not_enough_balance(
        &self,
        required: Decimal,
        available: Decimal,
    ) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.not_enough_balance(required, available))
            .await
    }

    async fn already_onboarded(&self, role: NodeRole) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.already_onboarded(role)).await
    }

    async fn ask_for_apollo_deposit(
        &self,
        minimum: Decimal,
        preferred: Option<Decimal>,
    ) -> Result<Decimal, DialogError> {
        let below_minimum = self.messages.deposit_below_minimum(minimum);
        self.prompt
            .ask_until(
                &self.messages.apollo_deposit_question(minimum, preferred),
                |s| {
                    let amount = validation::parse_amount(s)?;
                    if amount < minimum {
                        return Err(ValidationError::Amount(below_minimum.clone()));
                    }
                    Ok(amount)
                },
            )
            .await
    }

    async fn onboarding_confirmation(
        &self,
        address: &str,
        role: NodeRole,
        deposit: Decimal,
    ) -> Result<bool, DialogError> {
        self.prompt
            .confirm(&self.messages.onboarding_confirmation(address, role, deposit))
            .await
    }

    async fn onboarding_successful(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.onboarding_successful()).await
    }

    async fn insufficient_funds(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.insufficient_funds()).await
    }

    async fn generic_error(&self, message: &str) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.generic_error(message)).await
    }

    async fn run_instructions(
        &self,
        healthcheck_url: Option<&str>,
        output_dir: &Path,
    ) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.run_instructions(healthcheck_url, output_dir))
            .await
    }

    async fn select_action(&self, actions: &[ActionKind]) -> Result<ActionKind, DialogError> {
        let options: Vec<(String, ActionKind)> = actions
            .iter()
            .map(|a| (self.messages.action_label(*a), *a))
            .collect();
        self.prompt
            .choose(&self.messages.select_action(), &options)
            .await
    }

    async fn nectar_warning(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.nectar_warning()).await
    }

    async fn change_url_confirmation(&self, old_url: &str, new_url: &str) -> Result<bool, DialogError> {
        self.prompt
            .confirm(&self.messages.change_url_confirmation(old_url, new_url))
            .await
    }

    async fn change_url_successful(&self, new_url: &str) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.change_url_successful(new_url))
            .await
    }

    async fn available_payout(&self, amount: Decimal) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.available_payout(amount)).await
    }

    async fn nothing_to_withdraw(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.nothing_to_withdraw()).await
    }

    async fn confirm_payout_withdrawal(&self, amount: Decimal) -> Result<bool, DialogError> {
        self.prompt
            .confirm(&self.messages.confirm_payout_withdrawal(amount))
            .await
    }

    async fn withdrawal_successful(&self, amount: Decimal) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.withdrawal_successful(amount))
            .await
    }

    async fn confirm_retirement(&self) -> Result<bool, DialogError> {
        self.prompt
            .confirm(&self.messages.confirm_retirement())
            .await
    }

    async fn continue_retirement(&self) -> Result<RetirementChoice, DialogError> {
        let options = vec![
            (
                self.messages.retirement_continue_label(),
                RetirementChoice::Continue,
            ),
            (self.messages.retirement_stop_label(), RetirementChoice::Stop),
        ];
        self.prompt
            .choose(&self.messages.continue_retirement(), &options)
            .await
    }

    async fn retirement_start_successful(&self) -> Result<(), DialogError> {
        self.prompt
            .say(&self.messages.retirement_start_successful())
            .await
    }

    async fn retirement_successful(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.retirement_successful()).await
    }

    async fn retirement_stopped(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.retirement_stopped()).await
    }

    async fn already_retired(&self) -> Result<(), DialogError> {
        self.prompt.say(&self.messages.already_retired()).await
    }
}
