//! Message catalog for the terminal dialogs.

use std::path::Path;

use rust_decimal::Decimal;

use crate::actions::ActionKind;
use crate::state::NodeRole;
use crate::state::validation::TOS_SENTENCE_TEMPLATE;

/// User-facing wording, kept apart from the dialog control flow so it can be
/// replaced (e.g. translated) without touching the dialogs.
#[derive(Debug, Clone)]
pub struct Messages {
    /// Ticker of the network's native token.
    pub token: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            token: "AMB".to_string(),
        }
    }
}

impl Messages {
    pub fn docker_detected(&self) -> String {
        "✅ Docker is installed".to_string()
    }

    pub fn docker_missing(&self) -> String {
        "❌ Docker is required but was not found. Install it (https://docs.docker.com/install/) and run the wizard again.".to_string()
    }

    pub fn private_key_source(&self) -> String {
        "No private key found. Do you want to generate a new one or use an existing key?".to_string()
    }

    pub fn private_key_generate(&self) -> String {
        "Generate a new key".to_string()
    }

    pub fn private_key_manual(&self) -> String {
        "Enter an existing key".to_string()
    }

    pub fn private_key_input(&self) -> String {
        "Private key (0x followed by 64 hex characters):".to_string()
    }

    pub fn private_key_detected(&self, address: &str) -> String {
        format!("🔑 Private key detected. Your address is {address}")
    }

    pub fn network_question(&self) -> String {
        "Which network do you want to join?".to_string()
    }

    pub fn network_selected(&self, name: &str) -> String {
        format!("🌐 Network: {name}")
    }

    pub fn docker_restart_required(&self) -> String {
        "⚠️  The network configuration changed. Restart your node containers after the wizard finishes.".to_string()
    }

    pub fn tos_intro(&self, tos_text: &str) -> String {
        format!(
            "{tos_text}\n\nTo accept the terms above, type the following sentence with your name:\n  {TOS_SENTENCE_TEMPLATE}"
        )
    }

    pub fn tos_question(&self) -> String {
        "Acceptance sentence:".to_string()
    }

    pub fn node_type_question(&self) -> String {
        "Which type of node do you want to run?".to_string()
    }

    pub fn role_label(&self, role: NodeRole) -> String {
        match role {
            NodeRole::Atlas => "Atlas (storage)".to_string(),
            NodeRole::Hermes => "Hermes (relay)".to_string(),
            NodeRole::Apollo => "Apollo (gateway)".to_string(),
        }
    }

    pub fn apollo_minimal_deposit_question(&self) -> String {
        format!("Minimal deposit you intend to stake as an Apollo ({}):", self.token)
    }

    pub fn role_selected(&self, role: NodeRole) -> String {
        format!("🧭 Node type: {role}")
    }

    pub fn node_url_question(&self) -> String {
        "Public URL of your node (e.g. https://node.example.com):".to_string()
    }

    pub fn node_url_detected(&self, url: &str) -> String {
        format!("🔗 Node URL: {url}")
    }

    pub fn node_ip_question(&self) -> String {
        "Public IPv4 address of your node:".to_string()
    }

    pub fn node_ip_detected(&self, ip: &str) -> String {
        format!("📍 Node IP: {ip}")
    }

    pub fn user_email_question(&self) -> String {
        "Contact email (optional, leave blank to skip):".to_string()
    }

    pub fn user_email_detected(&self, email: &str) -> String {
        if email.is_empty() {
            "✉️  No contact email provided".to_string()
        } else {
            format!("✉️  Contact email: {email}")
        }
    }

    pub fn invalid_input(&self, error: &str) -> String {
        format!("⚠️  {error}. Please try again.")
    }

    pub fn address_whitelisted(&self, role: NodeRole, deposit: Decimal) -> String {
        format!(
            "✅ Your address is whitelisted as {role}. Required deposit: {deposit} {}",
            self.token
        )
    }

    pub fn address_not_whitelisted(&self, address: &str) -> String {
        format!(
            "⏳ Address {address} is not whitelisted yet. Send the submission below to the network operators, then run the wizard again."
        )
    }

    pub fn submission_header(&self) -> String {
        "Submission:".to_string()
    }

    pub fn role_mismatch(&self, whitelisted: NodeRole, chosen: NodeRole) -> String {
        format!(
            "❌ Your address is whitelisted as {whitelisted}, but you selected {chosen}. Contact the network operators."
        )
    }

    pub fn not_enough_balance(&self, required: Decimal, available: Decimal) -> String {
        format!(
            "❌ Not enough funds: {required} {token} required, {available} {token} available. Top up your address and run the wizard again.",
            token = self.token
        )
    }

    pub fn already_onboarded(&self, role: NodeRole) -> String {
        format!("ℹ️  This address is already onboarded as {role}.")
    }

    pub fn apollo_deposit_question(&self, minimum: Decimal, preferred: Option<Decimal>) -> String {
        match preferred {
            Some(p) => format!(
                "Deposit to stake ({}), at least {minimum} (you planned {p}):",
                self.token
            ),
            None => format!("Deposit to stake ({}), at least {minimum}:", self.token),
        }
    }

    pub fn deposit_below_minimum(&self, minimum: Decimal) -> String {
        format!("The deposit must be at least {minimum} {}", self.token)
    }

    pub fn onboarding_confirmation(&self, address: &str, role: NodeRole, deposit: Decimal) -> String {
        format!(
            "Onboard {address} as {role} with a deposit of {deposit} {}?",
            self.token
        )
    }

    pub fn onboarding_successful(&self) -> String {
        "🎉 Onboarding successful!".to_string()
    }

    pub fn insufficient_funds(&self) -> String {
        "❌ The transaction failed: insufficient funds to cover the deposit and fees.".to_string()
    }

    pub fn generic_error(&self, message: &str) -> String {
        format!("❌ Something went wrong: {message}")
    }

    pub fn run_instructions(&self, healthcheck_url: Option<&str>, output_dir: &Path) -> String {
        let mut text = format!(
            "Your node setup is ready in {}.\nStart it with:\n  cd {} && docker-compose up -d",
            output_dir.display(),
            output_dir.display()
        );
        if let Some(url) = healthcheck_url {
            text.push_str(&format!("\nOnce it runs, check its health at {url}"));
        }
        text
    }

    pub fn select_action(&self) -> String {
        "What do you want to do?".to_string()
    }

    pub fn action_label(&self, action: ActionKind) -> String {
        match action {
            ActionKind::ChangeUrl => "Change node URL".to_string(),
            ActionKind::Payouts => "Withdraw payouts".to_string(),
            ActionKind::Retire => "Retire".to_string(),
            ActionKind::Quit => "Quit".to_string(),
        }
    }

    pub fn nectar_warning(&self) -> String {
        "⚠️  Changing the URL costs gas and your node is unreachable until the new URL serves it.".to_string()
    }

    pub fn change_url_confirmation(&self, old_url: &str, new_url: &str) -> String {
        format!("Change the node URL from {old_url} to {new_url}?")
    }

    pub fn change_url_successful(&self, new_url: &str) -> String {
        format!("✅ Node URL changed to {new_url}")
    }

    pub fn available_payout(&self, amount: Decimal) -> String {
        format!("💰 Available payout: {amount} {}", self.token)
    }

    pub fn nothing_to_withdraw(&self) -> String {
        "There is nothing to withdraw yet.".to_string()
    }

    pub fn confirm_payout_withdrawal(&self, amount: Decimal) -> String {
        format!("Withdraw {amount} {}?", self.token)
    }

    pub fn withdrawal_successful(&self, amount: Decimal) -> String {
        format!("✅ Withdrew {amount} {}", self.token)
    }

    pub fn confirm_retirement(&self) -> String {
        "Retiring removes your node from the network and returns your stake. Continue?".to_string()
    }

    pub fn continue_retirement(&self) -> String {
        "A retirement is already in progress. What do you want to do?".to_string()
    }

    pub fn retirement_continue_label(&self) -> String {
        "Continue the retirement".to_string()
    }

    pub fn retirement_stop_label(&self) -> String {
        "Stop the retirement".to_string()
    }

    pub fn retirement_start_successful(&self) -> String {
        "⏳ Retirement started. Run Retire again once the node has been released to finish it.".to_string()
    }

    pub fn retirement_successful(&self) -> String {
        "✅ Retirement complete. You can now stop and remove the node containers.".to_string()
    }

    pub fn retirement_stopped(&self) -> String {
        "Retirement stopped. Your node stays active.".to_string()
    }

    pub fn already_retired(&self) -> String {
        "ℹ️  This node has already retired.".to_string()
    }
}
