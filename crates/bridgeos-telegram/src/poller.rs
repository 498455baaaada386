// SPDX-FileCopyrightText: 2026 BridgeOS Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-polling update loop for one bot slot.
//!
//! The edge stays thin: it upserts the sender, parses the two wire-visible
//! conventions (the `invite_` deep link and the `**` task trigger), hands
//! everything to the engine, and renders short English placeholder replies.
//! Keyboards, media forwarding, and localized rendering live outside the
//! core.

use bridgeos_core::{BotSlot, BridgeError, Role};
use bridgeos_engine::{invite, CompletedTask, Relay, Routed};
use teloxide::prelude::*;
use tracing::{debug, error, info};

/// Runs the long-polling dispatcher for this process's slot.
///
/// Only direct messages are handled; everything else is ignored.
pub async fn run_polling(bot: Bot, relay: Relay, bot_slot: BotSlot) {
    info!(bot_slot, "starting Telegram long polling");

    let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let relay = relay.clone();
        async move {
            if !msg.chat.is_private() {
                debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                return respond(());
            }
            let Some(from) = msg.from.clone() else {
                return respond(());
            };
            let Some(text) = msg.text().map(str::to_owned) else {
                debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
                return respond(());
            };

            let sender_id = from.id.0 as i64;
            let display_name = from.first_name.clone();

            let reply = match handle_text(&relay, sender_id, &display_name, bot_slot, &text).await
            {
                Ok(Some(reply)) => Some(reply),
                Ok(None) => None,
                Err(err) => {
                    error!(sender_id, error = %err, "handler failed");
                    user_facing_message(&relay, sender_id, &err)
                }
            };

            if let Some(reply) = reply {
                if let Err(e) = bot.send_message(msg.chat.id, reply).await {
                    error!(chat_id = msg.chat.id.0, error = %e, "failed to reply");
                }
            }
            respond(())
        }
    });

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {}) // Silently ignore non-message updates.
        .build()
        .dispatch()
        .await;
}

/// Routes one inbound text. `Ok(Some)` carries a reply for the sender.
async fn handle_text(
    relay: &Relay,
    sender_id: i64,
    display_name: &str,
    bot_slot: BotSlot,
    text: &str,
) -> Result<Option<String>, BridgeError> {
    relay
        .upsert_user(sender_id, display_name, None, None)
        .await?;

    if let Some(rest) = text.strip_prefix("/start") {
        return handle_start(relay, sender_id, bot_slot, rest.trim()).await;
    }
    if text == "/daily" {
        let items = relay.daily_action_items(sender_id).await?;
        return Ok(Some(items));
    }
    if text == "/tasks" {
        return handle_tasks(relay, sender_id).await;
    }
    if text == "/addworker" {
        return handle_addworker(relay, sender_id, bot_slot).await;
    }
    if text == "/workers" {
        return handle_workers(relay, sender_id).await;
    }
    if let Some(arg) = text.strip_prefix("/done ") {
        return handle_done(relay, sender_id, arg.trim()).await;
    }
    if text == "/reset" {
        let dropped = relay.reset_user(sender_id).await?;
        return Ok(Some(match dropped {
            Some(role) => format!("Your {role} registration was removed. Use /start to begin again."),
            None => "Nothing to reset. Use /start to register.".to_string(),
        }));
    }
    if let Some(language) = text.strip_prefix("/language ") {
        relay.set_language(sender_id, language.trim()).await?;
        return Ok(Some(format!("Language set to {}.", language.trim())));
    }
    if let Some(message) = text.strip_prefix("/feedback ") {
        relay
            .submit_feedback(sender_id, Some(display_name), None, message.trim())
            .await?;
        return Ok(Some("Thanks, your feedback was recorded.".to_string()));
    }

    match relay.route_text(sender_id, bot_slot, text).await? {
        Routed::Delivered(delivery) => Ok(delivery.now_blocked.then(|| {
            "That was your last free message. Subscribe to continue without limits.".to_string()
        })),
        Routed::TaskCreated(task) => Ok(Some(format!(
            "Task #{} created: {}",
            task.task_id, task.description
        ))),
    }
}

/// `/start`, optionally carrying an `invite_BRIDGE-DDDDD` deep link.
async fn handle_start(
    relay: &Relay,
    sender_id: i64,
    bot_slot: BotSlot,
    arg: &str,
) -> Result<Option<String>, BridgeError> {
    if let Some(code) = invite::code_from_start_arg(arg) {
        if relay.role(sender_id).await?.is_some() {
            return Ok(Some(
                "You're already registered. Use /reset first if you want to start over."
                    .to_string(),
            ));
        }
        let connection = relay.redeem_invitation(sender_id, code, bot_slot).await?;
        info!(
            connection_id = connection.connection_id,
            worker_id = sender_id,
            bot_slot,
            "worker joined via invite link"
        );
        return Ok(Some(
            "You're connected! Messages you send here are translated for your contact."
                .to_string(),
        ));
    }

    match relay.role(sender_id).await? {
        Some(role) => Ok(Some(format!("Welcome back! You're registered as {role}."))),
        None => Ok(Some(
            "Welcome to BridgeOS! Managers: register from the main bot. \
             Workers: open the invitation link your manager shared."
                .to_string(),
        )),
    }
}

/// `/tasks`: pending plus completed-today, rendered per role.
async fn handle_tasks(relay: &Relay, sender_id: i64) -> Result<Option<String>, BridgeError> {
    let Some(role) = relay.role(sender_id).await? else {
        return Ok(Some("Use /start to register first.".to_string()));
    };

    let listings = match role {
        Role::Manager => relay.tasks_for_manager(sender_id, None).await?,
        Role::Worker => relay.tasks_for_worker(sender_id, None).await?,
    };
    if listings.is_empty() {
        return Ok(Some(match role {
            Role::Manager => {
                "No tasks yet. Create one by sending a message starting with **\n\
                 Example: ** Check cow 115"
                    .to_string()
            }
            Role::Worker => "No tasks assigned yet.".to_string(),
        }));
    }

    // Group by the counterpart, pending before completed.
    let mut out = String::from("Your tasks:\n");
    for (header, completed) in [("Pending", false), ("Completed today", true)] {
        let mut group: Vec<_> = listings
            .iter()
            .filter(|t| (t.status == "completed") == completed)
            .collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by_key(|t| t.counterpart_id);
        out.push_str(&format!("\n{header} ({}):\n", group.len()));
        for task in group {
            let description = match role {
                // The worker reads the translated description.
                Role::Worker => task
                    .description_translated
                    .as_deref()
                    .unwrap_or(&task.description),
                Role::Manager => &task.description,
            };
            out.push_str(&format!(
                "#{} [{}] {description}\n",
                task.task_id, task.counterpart_name
            ));
        }
    }
    Ok(Some(out))
}

/// `/addworker`: hand the manager an invite link for the next free slot.
async fn handle_addworker(
    relay: &Relay,
    sender_id: i64,
    bot_slot: BotSlot,
) -> Result<Option<String>, BridgeError> {
    let Some(manager) = relay.manager(sender_id).await? else {
        return Ok(Some("Only managers can add workers.".to_string()));
    };
    let Some(next_slot) = relay.next_free_slot(sender_id).await? else {
        return Ok(Some(
            "All 5 worker slots are in use. Disconnect a worker first.".to_string(),
        ));
    };
    let link = match relay.config().bot.username_for_slot(next_slot) {
        Some(username) => invite::invite_link(username, &manager.code),
        None => format!("(bot {next_slot} is not configured) code {}", manager.code),
    };
    let note = if next_slot == bot_slot {
        String::new()
    } else {
        format!("\nYour worker will chat with you through bot {next_slot}.")
    };
    Ok(Some(format!(
        "Share this invitation with your worker:\n{link}{note}"
    )))
}

/// `/workers`: slot-by-slot overview for a manager.
async fn handle_workers(relay: &Relay, sender_id: i64) -> Result<Option<String>, BridgeError> {
    if relay.manager(sender_id).await?.is_none() {
        return Ok(Some("Only managers can view workers.".to_string()));
    }
    let connections = relay.connections_for_manager(sender_id).await?;

    let mut out = String::from("Your workers:\n");
    for slot in 1..=5 {
        match connections.iter().find(|c| c.bot_slot == slot) {
            Some(conn) => {
                let name = relay
                    .user(conn.worker_id)
                    .await?
                    .map(|u| u.display_name)
                    .unwrap_or_else(|| format!("Worker {}", conn.worker_id));
                out.push_str(&format!("Bot {slot}: {name}\n"));
            }
            None => out.push_str(&format!("Bot {slot}: available\n")),
        }
    }
    out.push_str("\nTo add a worker: /addworker");
    Ok(Some(out))
}

/// `/done <task_id>` from a worker.
async fn handle_done(
    relay: &Relay,
    sender_id: i64,
    arg: &str,
) -> Result<Option<String>, BridgeError> {
    let Ok(task_id) = arg.parse::<i64>() else {
        return Ok(Some("Usage: /done <task number>".to_string()));
    };
    match relay.complete_task(task_id, sender_id).await? {
        CompletedTask::Completed(task) => {
            Ok(Some(format!("Task #{} marked as completed.", task.task_id)))
        }
        CompletedTask::AlreadyCompleted(task) => Ok(Some(format!(
            "Task #{} was already completed.",
            task.task_id
        ))),
    }
}

/// Short, user-facing rendering of an engine error. The underlying
/// constraint identifier is never surfaced. `None` drops the message
/// without a reply.
fn user_facing_message(relay: &Relay, sender_id: i64, err: &BridgeError) -> Option<String> {
    let text = match err {
        BridgeError::LimitReached { free_limit } => {
            let checkout = relay.config().billing.checkout_url(sender_id);
            format!(
                "You've used all {free_limit} free messages. Subscribe to continue: {checkout}"
            )
        }
        BridgeError::NotConnected { .. } => {
            "You don't have a connection on this bot yet. Share or open an invitation link first."
                .to_string()
        }
        BridgeError::SlotOccupied { .. } => {
            "This bot already has a worker connected. Ask your manager for a link to a free bot."
                .to_string()
        }
        BridgeError::WorkerAlreadyConnected { .. } => {
            "You're already connected to a contact. Use /reset to disconnect first.".to_string()
        }
        BridgeError::InvalidCode(_) => {
            "That invitation link is not valid. Ask your manager for a fresh one.".to_string()
        }
        BridgeError::EmptyTaskDescription => {
            "Task description is empty. Example: ** Check cow 115".to_string()
        }
        BridgeError::Forbidden => "You're not allowed to do that.".to_string(),
        BridgeError::TranslationFailed { .. }
        | BridgeError::TransportFailed { .. }
        | BridgeError::Timeout { .. }
        | BridgeError::PoolExhausted => {
            "Something went wrong, please try again in a moment.".to_string()
        }
        // Visible in logs only; the sender gets no reply.
        BridgeError::WrongSlot { .. } => return None,
        _ => "Something went wrong, please try again.".to_string(),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use bridgeos_core::Role;

    #[test]
    fn role_renders_lowercase_in_replies() {
        // The strum Display impl drives the /reset and /start wording.
        assert_eq!(format!("registered as {}", Role::Manager), "registered as manager");
    }
}
