//! In-memory gateway doubles for integration tests.
//!
//! [`InMemoryBackend`] implements every table, auth and storage gateway over
//! plain collections, counts calls per [`Operation`], and can be told to
//! fail any operation. [`RecordingNotifier`] keeps every webhook payload.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use snapdish_core::{
    AffiliateId, AuthUserId, Client, ClientId, ItemId, NewClient, ServicePackage, SubmissionId,
};

use crate::gateway::{
    AffiliateGateway, AuthGateway, ClientGateway, Commission, NewItem, NewSubmission,
    PackageGateway, SessionUser, StorageGateway, StoreError, SubmissionGateway,
    SubmissionNotifier,
};
use crate::state::Gateways;
use crate::webhook::{SubmissionWebhookPayload, WebhookError};

/// Gateway operations the in-memory backend counts and can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindClientByAuthId,
    FindClientsByEmail,
    LinkAuthUser,
    InsertClient,
    FindClientsByIds,
    FindPackage,
    SessionUser,
    Upload,
    InsertItem,
    DeleteItem,
    InsertSubmission,
    LinkSubmission,
    Commissions,
    Referrals,
}

/// An object stored through [`StorageGateway::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A stored submission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSubmission {
    pub submission_id: SubmissionId,
    pub row: NewSubmission,
}

#[derive(Default)]
struct Tables {
    clients: Vec<Client>,
    packages: Vec<ServicePackage>,
    items: BTreeMap<ItemId, NewItem>,
    submissions: Vec<StoredSubmission>,
    objects: BTreeMap<String, StoredObject>,
    commissions: Vec<Commission>,
    referrals: Vec<(AffiliateId, ClientId)>,
    session_user: Option<SessionUser>,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, StoreError>,
}

/// Every backend gateway over in-memory tables.
pub struct InMemoryBackend {
    bucket: String,
    tables: Mutex<Tables>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bucket: "submissions".to_owned(),
            tables: Mutex::new(Tables::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a call to `op` and return the tables, or the injected failure.
    fn enter(&self, op: Operation) -> Result<MutexGuard<'_, Tables>, StoreError> {
        let mut tables = self.lock();
        *tables.calls.entry(op).or_default() += 1;
        if let Some(err) = tables.failures.get(&op).cloned() {
            return Err(err);
        }
        Ok(tables)
    }

    /// Make every later call to `op` fail with `err`.
    pub fn fail(&self, op: Operation, err: StoreError) {
        self.lock().failures.insert(op, err);
    }

    pub fn recover(&self, op: Operation) {
        self.lock().failures.remove(&op);
    }

    /// How many times `op` was called, failed calls included.
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Calls that write to the `clients` table.
    #[must_use]
    pub fn client_writes(&self) -> usize {
        self.calls(Operation::InsertClient) + self.calls(Operation::LinkAuthUser)
    }

    pub fn add_package(&self, package: ServicePackage) {
        self.lock().packages.push(package);
    }

    /// Insert a client row directly, bypassing call counting.
    pub fn add_client(&self, client: Client) -> ClientId {
        let client_id = client.client_id;
        self.lock().clients.push(client);
        client_id
    }

    pub fn set_session_user(&self, user: Option<SessionUser>) {
        self.lock().session_user = user;
    }

    pub fn add_commission(&self, commission: Commission) {
        self.lock().commissions.push(commission);
    }

    pub fn add_referral(&self, affiliate_id: AffiliateId, client_id: ClientId) {
        self.lock().referrals.push((affiliate_id, client_id));
    }

    /// All client rows, oldest first.
    #[must_use]
    pub fn clients(&self) -> Vec<Client> {
        self.lock().clients.clone()
    }

    #[must_use]
    pub fn client(&self, client_id: ClientId) -> Option<Client> {
        self.lock()
            .clients
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned()
    }

    #[must_use]
    pub fn items(&self) -> BTreeMap<ItemId, NewItem> {
        self.lock().items.clone()
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<StoredSubmission> {
        self.lock().submissions.clone()
    }

    #[must_use]
    pub fn objects(&self) -> BTreeMap<String, StoredObject> {
        self.lock().objects.clone()
    }

    /// Gateways backed by this store, notifying through `notifier`.
    #[must_use]
    pub fn gateways(self: &Arc<Self>, notifier: Arc<dyn SubmissionNotifier>) -> Gateways {
        Gateways {
            clients: self.clone(),
            packages: self.clone(),
            auth: self.clone(),
            storage: self.clone(),
            submissions: self.clone(),
            affiliates: self.clone(),
            notifier,
        }
    }
}

#[async_trait]
impl ClientGateway for InMemoryBackend {
    async fn find_by_auth_id(&self, auth_user_id: AuthUserId) -> Result<Client, StoreError> {
        let tables = self.enter(Operation::FindClientByAuthId)?;
        tables
            .clients
            .iter()
            .find(|c| c.user_auth_id == Some(auth_user_id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("no client linked to this auth id"))
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Client>, StoreError> {
        let tables = self.enter(Operation::FindClientsByEmail)?;
        Ok(tables
            .clients
            .iter()
            .filter(|c| c.email == email)
            .cloned()
            .collect())
    }

    async fn link_auth_user(
        &self,
        client_id: ClientId,
        auth_user_id: AuthUserId,
    ) -> Result<Client, StoreError> {
        let mut tables = self.enter(Operation::LinkAuthUser)?;
        let client = tables
            .clients
            .iter_mut()
            .find(|c| c.client_id == client_id)
            .ok_or_else(|| StoreError::other("update matched no rows in clients"))?;
        client.user_auth_id = Some(auth_user_id);
        Ok(client.clone())
    }

    async fn insert(&self, client: NewClient) -> Result<Client, StoreError> {
        let mut tables = self.enter(Operation::InsertClient)?;
        let row = Client {
            client_id: ClientId::random(),
            email: client.email,
            user_auth_id: client.user_auth_id,
            restaurant_name: client.restaurant_name,
            contact_name: client.contact_name,
            phone: client.phone,
            current_package_id: client.current_package_id,
            remaining_servings: client.remaining_servings,
        };
        tables.clients.push(row.clone());
        Ok(row)
    }

    async fn find_by_ids(&self, client_ids: &[ClientId]) -> Result<Vec<Client>, StoreError> {
        let tables = self.enter(Operation::FindClientsByIds)?;
        Ok(tables
            .clients
            .iter()
            .filter(|c| client_ids.contains(&c.client_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PackageGateway for InMemoryBackend {
    async fn find_active_by_name(&self, name: &str) -> Result<ServicePackage, StoreError> {
        let tables = self.enter(Operation::FindPackage)?;
        tables
            .packages
            .iter()
            .find(|p| p.is_active && p.package_name == name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("no active package with this name"))
    }
}

#[async_trait]
impl AuthGateway for InMemoryBackend {
    async fn current_session_user(&self) -> Result<Option<SessionUser>, StoreError> {
        let tables = self.enter(Operation::SessionUser)?;
        Ok(tables.session_user.clone())
    }
}

#[async_trait]
impl StorageGateway for InMemoryBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.enter(Operation::Upload)?;
        if tables.objects.contains_key(path) {
            return Err(StoreError::other("The resource already exists"));
        }
        tables.objects.insert(
            path.to_owned(),
            StoredObject {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{path}", self.bucket)
    }
}

#[async_trait]
impl SubmissionGateway for InMemoryBackend {
    async fn insert_item(&self, item: NewItem) -> Result<ItemId, StoreError> {
        let mut tables = self.enter(Operation::InsertItem)?;
        let item_id = ItemId::random();
        tables.items.insert(item_id, item);
        Ok(item_id)
    }

    async fn delete_item(&self, item_id: ItemId) -> Result<(), StoreError> {
        let mut tables = self.enter(Operation::DeleteItem)?;
        tables.items.remove(&item_id);
        Ok(())
    }

    async fn insert_submission(
        &self,
        submission: NewSubmission,
    ) -> Result<SubmissionId, StoreError> {
        let mut tables = self.enter(Operation::InsertSubmission)?;
        let submission_id = SubmissionId::random();
        tables.submissions.push(StoredSubmission {
            submission_id,
            row: submission,
        });
        Ok(submission_id)
    }

    async fn link_submission(
        &self,
        submission_id: SubmissionId,
        client_id: ClientId,
    ) -> Result<(), StoreError> {
        let mut tables = self.enter(Operation::LinkSubmission)?;
        let submission = tables
            .submissions
            .iter_mut()
            .find(|s| s.submission_id == submission_id)
            .ok_or_else(|| StoreError::other("update matched no rows in submissions"))?;
        submission.row.client_id = client_id;
        let item_id = submission.row.item_id;
        if let Some(item) = tables.items.get_mut(&item_id) {
            item.client_id = client_id;
        }
        Ok(())
    }
}

#[async_trait]
impl AffiliateGateway for InMemoryBackend {
    async fn commissions_for(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<Commission>, StoreError> {
        let tables = self.enter(Operation::Commissions)?;
        let mut commissions: Vec<Commission> = tables
            .commissions
            .iter()
            .filter(|c| c.affiliate_id == affiliate_id)
            .cloned()
            .collect();
        commissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(commissions)
    }

    async fn referred_clients(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<ClientId>, StoreError> {
        let tables = self.enter(Operation::Referrals)?;
        Ok(tables
            .referrals
            .iter()
            .filter(|(affiliate, _)| *affiliate == affiliate_id)
            .map(|(_, client_id)| *client_id)
            .collect())
    }
}

/// Notifier that keeps every payload it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    payloads: Mutex<Vec<SubmissionWebhookPayload>>,
    reject_with: Option<u16>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose endpoint answers every payload with `status`.
    #[must_use]
    pub fn rejecting(status: u16) -> Self {
        Self {
            payloads: Mutex::default(),
            reject_with: Some(status),
        }
    }

    #[must_use]
    pub fn payloads(&self) -> Vec<SubmissionWebhookPayload> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SubmissionNotifier for RecordingNotifier {
    async fn notify(&self, payload: &SubmissionWebhookPayload) -> Result<(), WebhookError> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());
        match self.reject_with {
            Some(status) => Err(WebhookError::Rejected {
                status,
                message: "rejected by test notifier".to_owned(),
            }),
            None => Ok(()),
        }
    }
}
