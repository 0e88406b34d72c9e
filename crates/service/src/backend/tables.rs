//! Table gateways over the REST surface.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use snapdish_core::{
    AffiliateId, AuthUserId, Client, ClientId, ItemId, NewClient, ServicePackage, SubmissionId,
};

use super::{BackendClient, TableQuery};
use crate::gateway::{
    AffiliateGateway, ClientGateway, Commission, NewItem, NewSubmission, PackageGateway,
    StoreError, SubmissionGateway,
};

const CLIENTS: &str = "clients";
const SERVICE_PACKAGES: &str = "service_packages";
const MENU_ITEMS: &str = "menu_items";
const SUBMISSIONS: &str = "submissions";
const AFFILIATE_COMMISSIONS: &str = "affiliate_commissions";
const AFFILIATE_CLIENTS: &str = "affiliate_clients";

#[derive(Debug, Deserialize)]
struct ItemRow {
    item_id: ItemId,
}

#[derive(Debug, Deserialize)]
struct SubmissionRow {
    submission_id: SubmissionId,
    item_id: ItemId,
}

#[derive(Debug, Deserialize)]
struct ReferralRow {
    client_id: ClientId,
}

#[async_trait]
impl ClientGateway for BackendClient {
    #[instrument(skip(self))]
    async fn find_by_auth_id(&self, auth_user_id: AuthUserId) -> Result<Client, StoreError> {
        let query = TableQuery::new().eq("user_auth_id", auth_user_id);
        Ok(self.select_one(CLIENTS, &query).await?)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Vec<Client>, StoreError> {
        let query = TableQuery::new()
            .eq("email", email)
            .order("created_at", true);
        Ok(self.select_rows(CLIENTS, &query).await?)
    }

    #[instrument(skip(self))]
    async fn link_auth_user(
        &self,
        client_id: ClientId,
        auth_user_id: AuthUserId,
    ) -> Result<Client, StoreError> {
        let query = TableQuery::new().eq("client_id", client_id);
        let body = json!({ "user_auth_id": auth_user_id });
        Ok(self.update_row(CLIENTS, &query, &body).await?)
    }

    #[instrument(skip(self, client), fields(email = %client.email))]
    async fn insert(&self, client: NewClient) -> Result<Client, StoreError> {
        Ok(self.insert_row(CLIENTS, &client).await?)
    }

    #[instrument(skip(self), fields(count = client_ids.len()))]
    async fn find_by_ids(&self, client_ids: &[ClientId]) -> Result<Vec<Client>, StoreError> {
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = TableQuery::new().is_in("client_id", client_ids);
        Ok(self.select_rows(CLIENTS, &query).await?)
    }
}

#[async_trait]
impl PackageGateway for BackendClient {
    #[instrument(skip(self))]
    async fn find_active_by_name(&self, name: &str) -> Result<ServicePackage, StoreError> {
        let query = TableQuery::new()
            .eq("package_name", name)
            .eq("is_active", true)
            .limit(1);
        Ok(self.select_one(SERVICE_PACKAGES, &query).await?)
    }
}

#[async_trait]
impl SubmissionGateway for BackendClient {
    #[instrument(skip(self, item), fields(client_id = %item.client_id))]
    async fn insert_item(&self, item: NewItem) -> Result<ItemId, StoreError> {
        let row: ItemRow = self.insert_row(MENU_ITEMS, &item).await?;
        Ok(row.item_id)
    }

    #[instrument(skip(self))]
    async fn delete_item(&self, item_id: ItemId) -> Result<(), StoreError> {
        let query = TableQuery::new().eq("item_id", item_id);
        Ok(self.delete_rows(MENU_ITEMS, &query).await?)
    }

    #[instrument(skip(self, submission), fields(item_id = %submission.item_id))]
    async fn insert_submission(
        &self,
        submission: NewSubmission,
    ) -> Result<SubmissionId, StoreError> {
        let row: SubmissionRow = self.insert_row(SUBMISSIONS, &submission).await?;
        Ok(row.submission_id)
    }

    #[instrument(skip(self))]
    async fn link_submission(
        &self,
        submission_id: SubmissionId,
        client_id: ClientId,
    ) -> Result<(), StoreError> {
        let body = json!({ "client_id": client_id });
        let row: SubmissionRow = self
            .update_row(
                SUBMISSIONS,
                &TableQuery::new().eq("submission_id", submission_id),
                &body,
            )
            .await?;
        debug!(item_id = %row.item_id, "Submission relinked, moving its item");
        let _: ItemRow = self
            .update_row(
                MENU_ITEMS,
                &TableQuery::new().eq("item_id", row.item_id),
                &body,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AffiliateGateway for BackendClient {
    #[instrument(skip(self))]
    async fn commissions_for(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<Commission>, StoreError> {
        let query = TableQuery::new()
            .eq("affiliate_id", affiliate_id)
            .order("created_at", false);
        Ok(self.select_rows(AFFILIATE_COMMISSIONS, &query).await?)
    }

    #[instrument(skip(self))]
    async fn referred_clients(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<ClientId>, StoreError> {
        let query = TableQuery::new().eq("affiliate_id", affiliate_id);
        let rows: Vec<ReferralRow> = self.select_rows(AFFILIATE_CLIENTS, &query).await?;
        Ok(rows.into_iter().map(|row| row.client_id).collect())
    }
}
