use futures::channel::oneshot;
use parking_shared::{
    const_config::path::{
        PATH_ADMIN_ACCOUNT, PATH_ADMIN_ACCOUNTS, PATH_ADMIN_ACCOUNT_ADD_LEVEL,
        PATH_ADMIN_ACCOUNT_BLOCK, PATH_ADMIN_ACCOUNT_CREATE, PATH_ADMIN_ACCOUNT_REMOVE_LEVEL,
        PATH_ADMIN_ACCOUNT_UNBLOCK,
    },
    id::AccountId,
    req_args::{CreateAccountReqArgs, PageRequest},
    uac::{Account, AccountSummary, Role},
};

use crate::{
    client::{UiCallBack, NO_ARGS},
    Client,
};

impl Client {
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn get_accounts<F: UiCallBack>(
        &self,
        page: &PageRequest,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Vec<AccountSummary>>> {
        let query = page.to_query();
        self.send_request_expect_json(PATH_ADMIN_ACCOUNTS, &[], Some(&query), ui_notify)
    }

    /// Also returns the `ETag` of the account
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn get_account<F: UiCallBack>(
        &self,
        id: AccountId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<(Account, Option<String>)>> {
        let outgoing = self.build_request(PATH_ADMIN_ACCOUNT, &[id.to_string().as_str()], NO_ARGS);
        self.send_expect_json_with_etag(outgoing, ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn create_account<F: UiCallBack>(
        &self,
        args: &CreateAccountReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let mut body = args.account.to_json();
        body["userLevel"] = serde_json::json!(args.role);
        self.send_request_expect_empty(PATH_ADMIN_ACCOUNT_CREATE, &[], Some(&body), ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn block_account<F: UiCallBack>(
        &self,
        id: AccountId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_ADMIN_ACCOUNT_BLOCK,
            &[id.to_string().as_str()],
            NO_ARGS,
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn unblock_account<F: UiCallBack>(
        &self,
        id: AccountId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_ADMIN_ACCOUNT_UNBLOCK,
            &[id.to_string().as_str()],
            NO_ARGS,
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn add_role<F: UiCallBack>(
        &self,
        id: AccountId,
        role: Role,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_ADMIN_ACCOUNT_ADD_LEVEL,
            &[id.to_string().as_str(), role.as_ref()],
            NO_ARGS,
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn remove_role<F: UiCallBack>(
        &self,
        id: AccountId,
        role: Role,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_ADMIN_ACCOUNT_REMOVE_LEVEL,
            &[id.to_string().as_str(), role.as_ref()],
            NO_ARGS,
            ui_notify,
        )
    }
}
