//! Telegram transport: long-polling via teloxide, mapping updates onto the
//! note dispatcher and outcomes back onto messages.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::utils::command::BotCommands;
use teloxide::{ApiError, RequestError};
use tokio::task::JoinError;

use super::dispatcher::{NoteCommand, NoteDispatcher, Outcome};
use crate::menu::markdown::escape_markdown_v2;
use crate::menu::{Keyboard, View};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Daybook commands:")]
pub enum Command {
    #[command(description = "welcome screen and main menu")]
    Start,
    #[command(description = "show today's note")]
    Today,
    #[command(description = "show a note, e.g. /get 05-Feb-2025")]
    Get(String),
    #[command(description = "return to the main menu")]
    Reset,
}

impl From<Command> for NoteCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => NoteCommand::Start,
            Command::Today => NoteCommand::Today,
            Command::Get(arg) => NoteCommand::Get(arg),
            Command::Reset => NoteCommand::Reset,
        }
    }
}

pub fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.action.to_string()))
            .collect::<Vec<_>>()
    }))
}

/// Poll Telegram until Ctrl-C
pub async fn run(bot_token: String, notes: Arc<NoteDispatcher>) {
    let bot = Bot::new(bot_token);

    match bot.get_me().await {
        Ok(me) => log::info!("[TELEGRAM] Connected as @{}", me.username()),
        Err(e) => log::warn!("[TELEGRAM] getMe failed, polling anyway: {}", e),
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
                .branch(dptree::endpoint(handle_message)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    log::info!("[TELEGRAM] Starting long polling");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![notes])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    log::info!("[TELEGRAM] Polling stopped");
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, notes: Arc<NoteDispatcher>) -> HandlerResult {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0;
    log::debug!("[TELEGRAM] Command {:?} from {}", cmd, user_id);

    let command: NoteCommand = cmd.into();
    let outcome = off_thread(&notes, move |d| d.handle_command(user_id, command)).await?;
    reply(&bot, &notes, msg.chat.id, user_id, outcome).await
}

async fn handle_message(bot: Bot, msg: Message, notes: Arc<NoteDispatcher>) -> HandlerResult {
    let (Some(user), Some(text)) = (msg.from(), msg.text()) else {
        return Ok(());
    };
    let user_id = user.id.0;

    // Unparsed commands (unknown name, bad arguments) are not note text
    if text.starts_with('/') {
        log::debug!("[TELEGRAM] Ignoring unrecognized command {:?}", text);
        return Ok(());
    }

    let text = text.to_string();
    let outcome = off_thread(&notes, move |d| d.handle_text(user_id, &text)).await?;
    reply(&bot, &notes, msg.chat.id, user_id, outcome).await
}

async fn handle_callback(bot: Bot, q: CallbackQuery, notes: Arc<NoteDispatcher>) -> HandlerResult {
    let user_id = q.from.id.0;
    let data = q.data.clone().unwrap_or_default();
    let outcome = off_thread(&notes, move |d| d.handle_menu(user_id, &data)).await?;

    // Always answer so the client stops its spinner
    let answer = bot.answer_callback_query(q.id.clone());
    let view = match outcome {
        Outcome::Alert(text) => {
            answer.text(text).show_alert(true).await?;
            return Ok(());
        }
        Outcome::Reply(view) | Outcome::Rejected(Some(view)) => {
            answer.await?;
            view
        }
        Outcome::Ignored | Outcome::Rejected(None) => {
            answer.await?;
            return Ok(());
        }
    };

    match q.message {
        Some(message) => {
            edit_view(&bot, &notes, message.chat.id, message.id, user_id, &view).await
        }
        // Message too old for Telegram to attach; edit the last one we sent instead
        None => match notes.last_message_id(user_id) {
            Some(id) => edit_view(&bot, &notes, ChatId(user_id as i64), MessageId(id), user_id, &view).await,
            None => {
                let sent = send_view(&bot, ChatId(user_id as i64), &view).await?;
                notes.remember_message(user_id, sent.id.0);
                Ok(())
            }
        },
    }
}

/// Run a dispatcher call on the blocking pool; it reads and writes note files
async fn off_thread<R, F>(notes: &Arc<NoteDispatcher>, f: F) -> Result<R, JoinError>
where
    R: Send + 'static,
    F: FnOnce(&NoteDispatcher) -> R + Send + 'static,
{
    let notes = Arc::clone(notes);
    tokio::task::spawn_blocking(move || f(&notes)).await
}

async fn reply(
    bot: &Bot,
    notes: &NoteDispatcher,
    chat_id: ChatId,
    user_id: u64,
    outcome: Outcome,
) -> HandlerResult {
    let view = match outcome {
        Outcome::Reply(view) | Outcome::Rejected(Some(view)) => view,
        Outcome::Alert(text) => View::text_only(escape_markdown_v2(&text)),
        Outcome::Ignored | Outcome::Rejected(None) => return Ok(()),
    };

    let sent = send_view(bot, chat_id, &view).await?;
    notes.remember_message(user_id, sent.id.0);
    Ok(())
}

async fn send_view(bot: &Bot, chat_id: ChatId, view: &View) -> Result<Message, RequestError> {
    let mut request = bot
        .send_message(chat_id, view.text.clone())
        .parse_mode(ParseMode::MarkdownV2);
    if let Some(keyboard) = &view.keyboard {
        request = request.reply_markup(to_markup(keyboard));
    }
    request.await
}

/// Replace the pressed message with `view`, falling back to a new message
/// when Telegram refuses the edit
async fn edit_view(
    bot: &Bot,
    notes: &NoteDispatcher,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: u64,
    view: &View,
) -> HandlerResult {
    let mut request = bot
        .edit_message_text(chat_id, message_id, view.text.clone())
        .parse_mode(ParseMode::MarkdownV2);
    if let Some(keyboard) = &view.keyboard {
        request = request.reply_markup(to_markup(keyboard));
    }

    match request.await {
        Ok(_) => {
            notes.remember_message(user_id, message_id.0);
            Ok(())
        }
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => {
            log::warn!("[TELEGRAM] Edit of message {} failed, sending new: {}", message_id.0, e);
            let sent = send_view(bot, chat_id, view).await?;
            notes.remember_message(user_id, sent.id.0);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::actions::MenuAction;
    use crate::menu::Button;
    use crate::notes::{LogicalClock, NoteStore};

    #[test]
    fn test_to_markup_keeps_layout_and_payloads() {
        let keyboard = Keyboard::new()
            .row(vec![
                Button::new("◀", MenuAction::PrevMonth),
                Button::new("▶", MenuAction::NextMonth),
            ])
            .row(vec![Button::new("☐ task", MenuAction::ToggleTask(3))]);

        let markup = to_markup(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "☐ task");
        assert_eq!(
            markup.inline_keyboard[1][0].kind,
            teloxide::types::InlineKeyboardButtonKind::CallbackData("task:toggle:3".to_string())
        );
    }

    #[tokio::test]
    async fn test_dispatcher_calls_run_off_thread() {
        let dir = tempfile::tempdir().unwrap();
        let store = NoteStore::new(dir.path().to_path_buf(), "Templates");
        let notes = Arc::new(NoteDispatcher::new(store, LogicalClock::new(3, 7).unwrap(), 42));

        let outcome = off_thread(&notes, |d| d.handle_text(42, "written from the blocking pool"))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Reply(_)));

        let today = LogicalClock::new(3, 7).unwrap().today();
        let content = notes.store().read(&today).unwrap().unwrap();
        assert!(content.ends_with("written from the blocking pool\n"));

        let rejected = off_thread(&notes, |d| d.handle_menu(7, "menu:tasks")).await.unwrap();
        assert!(matches!(rejected, Outcome::Rejected(Some(_))));
    }

    #[test]
    fn test_command_parsing() {
        let cmd = Command::parse("/get 05-Feb-2025", "daybook_bot").unwrap();
        assert_eq!(NoteCommand::from(cmd), NoteCommand::Get("05-Feb-2025".to_string()));
        let cmd = Command::parse("/today", "daybook_bot").unwrap();
        assert_eq!(NoteCommand::from(cmd), NoteCommand::Today);
    }
}
