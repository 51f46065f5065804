//! In-memory fakes of the bot collaborators for the flow tests

use crate::db::{TgUser, User, UserService, UserType, UserUpdate};
use crate::localizer::{self, Localizer};
use crate::tg::{AdminLog, Deps, Messenger};
use crate::treasury::{Treasury, TrxType};
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use teloxide::types::{ChatId, MessageId, UserId};

pub(crate) const ADMIN_CHAT: ChatId = ChatId(-1);

pub(crate) fn user(id: u64, user_type: UserType) -> User {
    User {
        id: UserId(id),
        user_type,
        inviter_id: None,
        nickname: Some(format!("user{id}")),
        balance: 0,
    }
}

pub(crate) fn tg_user(id: u64, language_code: Option<&str>, is_premium: bool) -> TgUser {
    TgUser {
        id: UserId(id),
        username: Some(format!("user{id}")),
        first_name: format!("User {id}"),
        last_name: None,
        language_code: language_code.map(ToOwned::to_owned),
        is_premium,
    }
}

pub(crate) struct Fixture {
    pub(crate) users: FakeUsers,
    pub(crate) treasury: FakeTreasury,
    pub(crate) messenger: Arc<FakeMessenger>,
    pub(crate) localizer: Localizer,
    pub(crate) admin_log: AdminLog,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let messenger = Arc::new(FakeMessenger::default());

        Self {
            users: Default::default(),
            treasury: Default::default(),
            admin_log: AdminLog::new(messenger.clone(), Some(ADMIN_CHAT)),
            messenger,
            localizer: Localizer::load(&localizer::default_localization_dir()).unwrap(),
        }
    }

    pub(crate) fn deps(&self) -> Deps<'_> {
        Deps {
            users: &self.users,
            treasury: &self.treasury,
            messenger: &*self.messenger,
            localizer: &self.localizer,
            admin_log: &self.admin_log,
        }
    }

    pub(crate) fn admin_logs(&self) -> Vec<String> {
        self.messenger.texts_to(ADMIN_CHAT)
    }
}

#[derive(Default)]
pub(crate) struct FakeUsers {
    users: Mutex<HashMap<UserId, User>>,
    tg_users: Mutex<HashMap<UserId, TgUser>>,
    updates: Mutex<Vec<(UserId, UserUpdate)>>,
}

impl FakeUsers {
    pub(crate) fn insert(&self, user: User, tg_user: Option<TgUser>) {
        if let Some(tg_user) = tg_user {
            self.tg_users.lock().insert(user.id, tg_user);
        }
        self.users.lock().insert(user.id, user);
    }

    pub(crate) fn get(&self, id: u64) -> User {
        self.users.lock()[&UserId(id)].clone()
    }

    pub(crate) fn tg_user(&self, id: u64) -> Option<TgUser> {
        self.tg_users.lock().get(&UserId(id)).cloned()
    }

    pub(crate) fn updates(&self) -> Vec<(UserId, UserUpdate)> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl UserService for FakeUsers {
    async fn get_or_create_user(
        &self,
        id: UserId,
        nickname: Option<&str>,
        default_type: UserType,
    ) -> Result<User> {
        let mut users = self.users.lock();
        let user = users.entry(id).or_insert_with(|| User {
            id,
            user_type: default_type,
            inviter_id: None,
            nickname: nickname.map(ToOwned::to_owned),
            balance: 0,
        });
        Ok(user.clone())
    }

    async fn upsert_tg_user(&self, tg_user: &TgUser) -> Result {
        self.tg_users.lock().insert(tg_user.id, tg_user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.lock().get(&id).cloned())
    }

    async fn get_tg_user(&self, id: UserId) -> Result<Option<TgUser>> {
        Ok(self.tg_users.lock().get(&id).cloned())
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result {
        self.updates.lock().push((id, update.clone()));

        let mut users = self.users.lock();
        let user = users.get_mut(&id).expect("BUG: updating a non-existing user");

        if let Some(inviter_id) = update.inviter_id {
            user.inviter_id = Some(inviter_id);
        }
        if let Some(user_type) = update.user_type {
            user.user_type = user_type;
        }

        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeTreasury {
    payments: Mutex<Vec<(UserId, TrxType, String)>>,
}

impl FakeTreasury {
    pub(crate) fn payments(&self) -> Vec<(UserId, TrxType, String)> {
        self.payments.lock().clone()
    }
}

#[async_trait]
impl Treasury for FakeTreasury {
    async fn pay_if_not_paid(
        &self,
        user_id: UserId,
        trx_type: TrxType,
        external_id: &str,
    ) -> Result<bool> {
        let payment = (user_id, trx_type, external_id.to_owned());
        let mut payments = self.payments.lock();
        if payments.contains(&payment) {
            return Ok(false);
        }
        payments.push(payment);
        Ok(true)
    }
}

#[derive(Default)]
pub(crate) struct FakeMessenger {
    failing_chats: Mutex<HashSet<ChatId>>,
    texts: Mutex<Vec<(ChatId, String)>>,
    photo_groups: Mutex<Vec<(ChatId, Vec<String>, String)>>,
    last_message_id: AtomicI32,
}

impl FakeMessenger {
    /// Makes all the messages to the given chat fail
    pub(crate) fn fail_for(&self, chat_id: ChatId) {
        self.failing_chats.lock().insert(chat_id);
    }

    pub(crate) fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.texts
            .lock()
            .iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Recipients of the texts in the order of sending excluding the admin log
    pub(crate) fn text_recipients(&self) -> Vec<ChatId> {
        self.texts
            .lock()
            .iter()
            .map(|(chat, _)| *chat)
            .filter(|chat| *chat != ADMIN_CHAT)
            .collect()
    }

    pub(crate) fn photo_groups(&self) -> Vec<(ChatId, Vec<String>, String)> {
        self.photo_groups.lock().clone()
    }

    fn check(&self, chat_id: ChatId) -> Result {
        if self.failing_chats.lock().contains(&chat_id) {
            return Err(teloxide::RequestError::Api(teloxide::ApiError::BotBlocked).into());
        }
        Ok(())
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.last_message_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_photo_group(
        &self,
        chat_id: ChatId,
        file_ids: Vec<String>,
        caption: String,
    ) -> Result<Vec<MessageId>> {
        self.check(chat_id)?;

        let ids = file_ids.iter().map(|_| self.next_message_id()).collect();

        self.photo_groups.lock().push((chat_id, file_ids, caption));

        Ok(ids)
    }

    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<MessageId> {
        self.check(chat_id)?;
        self.texts.lock().push((chat_id, text));
        Ok(self.next_message_id())
    }
}
