use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rolepanel::api::{AuthGateway, ScopedSession, SessionHandle, UserRecordService};
use rolepanel::config::DeletionPolicy;
use rolepanel::error::{AuthError, FlowError, ProvisioningStep, RecordError};
use rolepanel::flows::{delete_user, edit_role, provision_account, FlowContext, NewAccount, RoleEdit};
use rolepanel::models::{IdentityId, NewUserRecord, RecordId, RecordPatch, Role, Selection, StoredUser};
use rolepanel::services::{ensure_bootstrap_admin, LocalAuthGateway, LocalRecordStore};
use rolepanel::AdminSessionController;

/// Record service whose reads and writes can be switched off.
struct SwitchableRecords {
    inner: LocalRecordStore,
    fail_writes: AtomicBool,
    fail_list: AtomicBool,
}

impl SwitchableRecords {
    fn new() -> Self {
        Self {
            inner: LocalRecordStore::in_memory(),
            fail_writes: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<(), RecordError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RecordError::Write("permission denied".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRecordService for SwitchableRecords {
    async fn list_all(&self) -> Result<Vec<StoredUser>, RecordError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RecordError::Load("service unavailable".into()));
        }
        self.inner.list_all().await
    }

    async fn create(&self, record: NewUserRecord) -> Result<RecordId, RecordError> {
        self.check()?;
        self.inner.create(record).await
    }

    async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<(), RecordError> {
        self.check()?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RecordError> {
        self.check()?;
        self.inner.delete(id).await
    }
}

/// Auth gateway whose sign-out and identity deletion can be made to fail.
struct SwitchableAuth {
    inner: LocalAuthGateway,
    fail_sign_out: AtomicBool,
    fail_delete: AtomicBool,
    fail_credential: AtomicBool,
}

impl SwitchableAuth {
    fn new() -> Self {
        Self {
            inner: LocalAuthGateway::in_memory(),
            fail_sign_out: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_credential: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AuthGateway for SwitchableAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        self.inner.sign_in(email, password).await
    }

    async fn create_identity(
        &self,
        scope: &mut ScopedSession,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, AuthError> {
        self.inner.create_identity(scope, email, password).await
    }

    async fn delete_identity(&self, id: &IdentityId) -> Result<(), AuthError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AuthError::Provider("insufficient permissions".into()));
        }
        self.inner.delete_identity(id).await
    }

    async fn change_credential(&self, id: &IdentityId, new_password: &str) -> Result<(), AuthError> {
        if self.fail_credential.load(Ordering::SeqCst) {
            return Err(AuthError::Provider("requires recent login".into()));
        }
        self.inner.change_credential(id, new_password).await
    }

    async fn end_session(&self, session: &SessionHandle) -> Result<(), AuthError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Provider("network unreachable".into()));
        }
        self.inner.end_session(session).await
    }
}

struct Harness {
    auth: Arc<SwitchableAuth>,
    records: Arc<SwitchableRecords>,
    ctx: FlowContext,
}

fn harness() -> Harness {
    let auth = Arc::new(SwitchableAuth::new());
    let records = Arc::new(SwitchableRecords::new());
    let ctx = FlowContext::new(auth.clone(), records.clone());
    Harness { auth, records, ctx }
}

async fn create(ctx: &FlowContext, email: &str, role: &str) -> RecordId {
    let account = NewAccount::parse(email, "secret1", role).unwrap();
    provision_account(ctx, account).await.unwrap().record_id
}

#[tokio::test]
async fn provisioning_creates_identity_and_record() {
    let h = harness();
    let provisioned = provision_account(&h.ctx, NewAccount::parse("a@x.com", "secret1", "moderator").unwrap())
        .await
        .unwrap();

    let users = h.ctx.directory.snapshot();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "a@x.com");
    assert_eq!(users[0].role, Role::Moderator);
    assert_eq!(users[0].auth_identity_id, provisioned.identity_id);
    assert_eq!(users[0].created_at, users[0].last_updated);
    assert!(h.auth.inner.contains(&provisioned.identity_id));
    // The scoped provisioning session never outlives the call.
    assert_eq!(h.auth.inner.active_session_count(), 0);
}

#[tokio::test]
async fn duplicate_email_leaves_no_new_record() {
    let h = harness();
    create(&h.ctx, "a@x.com", "user").await;

    let err = provision_account(&h.ctx, NewAccount::parse("A@X.com", "other-secret", "admin").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, FlowError::Auth(AuthError::DuplicateEmail));
    assert_eq!(err.notification(), "This email is already registered");
    assert_eq!(h.records.inner.record_count(), 1);
    assert_eq!(h.auth.inner.identity_count(), 1);
}

#[tokio::test]
async fn failed_record_write_removes_the_new_identity() {
    let h = harness();
    h.records.fail_writes.store(true, Ordering::SeqCst);

    let err = provision_account(&h.ctx, NewAccount::parse("b@x.com", "secret1", "user").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FlowError::Provisioning {
            step: ProvisioningStep::WriteRecord,
            ..
        }
    ));
    assert_eq!(err.notification(), "Failed to create user");
    assert_eq!(h.auth.inner.identity_count(), 0);
    assert_eq!(h.records.inner.record_count(), 0);
    assert_eq!(h.auth.inner.active_session_count(), 0);
}

#[tokio::test]
async fn failed_cleanup_still_reports_the_record_failure() {
    let h = harness();
    h.records.fail_writes.store(true, Ordering::SeqCst);
    h.auth.fail_delete.store(true, Ordering::SeqCst);

    let err = provision_account(&h.ctx, NewAccount::parse("c@x.com", "secret1", "user").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Provisioning { .. }));
    // The orphaned identity is left behind; only the log records it.
    assert_eq!(h.auth.inner.identity_count(), 1);
    assert_eq!(h.auth.inner.active_session_count(), 0);
}

#[tokio::test]
async fn invalid_input_makes_no_calls() {
    let h = harness();
    assert!(matches!(
        NewAccount::parse("d@x.com", "12345", "user"),
        Err(FlowError::WeakPassword { min: 6 })
    ));
    assert!(matches!(
        NewAccount::parse("d@x.com", "secret1", "superuser"),
        Err(FlowError::InvalidRole(_))
    ));
    let err = provision_account(&h.ctx, NewAccount::parse("not-an-email", "secret1", "").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, FlowError::Auth(AuthError::InvalidEmail));
    assert_eq!(h.records.inner.record_count(), 0);
}

#[tokio::test]
async fn role_edit_bumps_last_updated_only() {
    let h = harness();
    let id = create(&h.ctx, "e@x.com", "user").await;
    let before = h.ctx.directory.find(&id).unwrap();

    let outcome = edit_role(&h.ctx, RoleEdit::parse(id.clone(), "moderator", None).unwrap())
        .await
        .unwrap();
    assert!(outcome.credential.is_none());

    let after = h.ctx.directory.find(&id).unwrap();
    assert_eq!(after.role, Role::Moderator);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.last_updated > before.last_updated);

    edit_role(&h.ctx, RoleEdit::parse(id.clone(), "admin", Some("")).unwrap())
        .await
        .unwrap();
    let latest = h.ctx.directory.find(&id).unwrap();
    assert!(latest.last_updated > after.last_updated);
}

#[tokio::test]
async fn role_edit_with_password_rotates_credential() {
    let h = harness();
    let id = create(&h.ctx, "f@x.com", "user").await;

    let outcome = edit_role(&h.ctx, RoleEdit::parse(id, "user", Some("brand-new")).unwrap())
        .await
        .unwrap();
    assert!(matches!(outcome.credential, Some(Ok(()))));
    assert!(h.auth.sign_in("f@x.com", "brand-new").await.is_ok());
    assert_eq!(
        h.auth.sign_in("f@x.com", "secret1").await.unwrap_err(),
        AuthError::InvalidCredentials
    );
}

#[tokio::test]
async fn credential_failure_is_reported_but_role_is_kept() {
    let h = harness();
    let id = create(&h.ctx, "g@x.com", "user").await;
    h.auth.fail_credential.store(true, Ordering::SeqCst);

    let outcome = edit_role(&h.ctx, RoleEdit::parse(id.clone(), "moderator", Some("brand-new")).unwrap())
        .await
        .unwrap();
    assert!(outcome.credential_failed());
    assert_eq!(h.ctx.directory.find(&id).unwrap().role, Role::Moderator);
}

#[tokio::test]
async fn failed_role_update_skips_password_step() {
    let h = harness();
    let id = create(&h.ctx, "h@x.com", "user").await;
    h.records.fail_writes.store(true, Ordering::SeqCst);

    let err = edit_role(&h.ctx, RoleEdit::parse(id.clone(), "admin", Some("brand-new")).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Update(_)));
    assert_eq!(err.notification(), "Failed to update user role");
    assert_eq!(h.ctx.directory.find(&id).unwrap().role, Role::User);
    assert!(h.auth.sign_in("h@x.com", "secret1").await.is_ok());
}

#[tokio::test]
async fn deletion_removes_record_and_identity() {
    let h = harness();
    let id = create(&h.ctx, "i@x.com", "user").await;
    let target = h.ctx.directory.find(&id).unwrap();

    let outcome = delete_user(&h.ctx, &target, DeletionPolicy::RecordAndIdentity)
        .await
        .unwrap();
    assert!(!outcome.identity_failed());
    assert!(h.ctx.directory.find(&id).is_none());
    assert!(!h.auth.inner.contains(&target.auth_identity_id));

    let err = delete_user(&h.ctx, &target, DeletionPolicy::RecordAndIdentity)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Deletion(_)));
    assert_eq!(err.notification(), "Failed to delete user");
}

#[tokio::test]
async fn identity_failure_does_not_restore_record() {
    let h = harness();
    let id = create(&h.ctx, "j@x.com", "user").await;
    let target = h.ctx.directory.find(&id).unwrap();
    h.auth.fail_delete.store(true, Ordering::SeqCst);

    let outcome = delete_user(&h.ctx, &target, DeletionPolicy::RecordAndIdentity)
        .await
        .unwrap();
    assert!(outcome.identity_failed());
    assert!(h.ctx.directory.find(&id).is_none());
    assert!(h.auth.inner.contains(&target.auth_identity_id));
}

#[tokio::test]
async fn record_only_policy_keeps_identity() {
    let h = harness();
    let id = create(&h.ctx, "k@x.com", "user").await;
    let target = h.ctx.directory.find(&id).unwrap();

    let outcome = delete_user(&h.ctx, &target, DeletionPolicy::RecordOnly).await.unwrap();
    assert!(outcome.identity.is_none());
    assert!(h.ctx.directory.is_empty());
    assert!(h.auth.inner.contains(&target.auth_identity_id));
}

#[tokio::test]
async fn login_requires_admin_role() {
    let h = harness();
    create(&h.ctx, "admin@x.com", "admin").await;
    create(&h.ctx, "user@x.com", "user").await;
    let sessions = AdminSessionController::new(h.auth.clone());

    assert_eq!(
        sessions.login(&h.ctx.directory, "user@x.com", "secret1").await.unwrap_err(),
        FlowError::NotAdmin
    );
    assert_eq!(
        sessions.login(&h.ctx.directory, "admin@x.com", "wrong-pass").await.unwrap_err(),
        FlowError::Auth(AuthError::InvalidCredentials)
    );
    assert_eq!(sessions.session_count(), 0);
    assert_eq!(h.auth.inner.active_session_count(), 0);

    let sid = sessions.login(&h.ctx.directory, " Admin@X.com ", "secret1").await.unwrap();
    assert!(sessions.is_authenticated(&sid));
    assert_eq!(sessions.current(&sid).unwrap().email, "admin@x.com");
}

#[tokio::test]
async fn logout_failure_keeps_session() {
    let h = harness();
    create(&h.ctx, "admin@x.com", "admin").await;
    let sessions = AdminSessionController::new(h.auth.clone());
    let sid = sessions.login(&h.ctx.directory, "admin@x.com", "secret1").await.unwrap();

    h.auth.fail_sign_out.store(true, Ordering::SeqCst);
    let err = sessions.logout(&sid).await.unwrap_err();
    assert!(matches!(err, FlowError::Logout(_)));
    assert_eq!(err.notification(), "Failed to log out");
    assert!(sessions.is_authenticated(&sid));

    h.auth.fail_sign_out.store(false, Ordering::SeqCst);
    sessions.logout(&sid).await.unwrap();
    assert!(!sessions.is_authenticated(&sid));
    assert_eq!(h.auth.inner.active_session_count(), 0);
}

#[tokio::test]
async fn login_ends_auth_session_when_directory_fails() {
    let h = harness();
    create(&h.ctx, "admin@x.com", "admin").await;
    let sessions = AdminSessionController::new(h.auth.clone());
    h.records.fail_list.store(true, Ordering::SeqCst);

    let err = sessions.login(&h.ctx.directory, "admin@x.com", "secret1").await.unwrap_err();
    assert!(matches!(err, FlowError::Load(_)));
    assert_eq!(err.notification(), "Failed to load users");
    assert_eq!(sessions.session_count(), 0);
    assert_eq!(h.auth.inner.active_session_count(), 0);
}

#[tokio::test]
async fn demoted_or_deleted_admin_loses_session() {
    let h = harness();
    let a = create(&h.ctx, "a@x.com", "admin").await;
    let b = create(&h.ctx, "b@x.com", "admin").await;
    create(&h.ctx, "c@x.com", "admin").await;
    let sessions = AdminSessionController::new(h.auth.clone());
    let sid_a = sessions.login(&h.ctx.directory, "a@x.com", "secret1").await.unwrap();
    let sid_b = sessions.login(&h.ctx.directory, "b@x.com", "secret1").await.unwrap();
    let sid_c = sessions.login(&h.ctx.directory, "c@x.com", "secret1").await.unwrap();
    assert!(sessions.revalidate(&sid_a, &h.ctx.directory).await);

    edit_role(&h.ctx, RoleEdit::parse(a, "user", None).unwrap()).await.unwrap();
    let target = h.ctx.directory.find(&b).unwrap();
    delete_user(&h.ctx, &target, DeletionPolicy::RecordAndIdentity).await.unwrap();

    assert!(!sessions.revalidate(&sid_a, &h.ctx.directory).await);
    assert!(!sessions.is_authenticated(&sid_a));
    assert!(!sessions.revalidate(&sid_b, &h.ctx.directory).await);
    assert!(!sessions.is_authenticated(&sid_b));
    assert!(sessions.revalidate(&sid_c, &h.ctx.directory).await);
    assert_eq!(sessions.session_count(), 1);
    // Only the remaining admin still holds an auth session.
    assert_eq!(h.auth.inner.active_session_count(), 1);
}

#[tokio::test]
async fn selection_is_single_and_per_session() {
    let h = harness();
    let id = create(&h.ctx, "admin@x.com", "admin").await;
    let sessions = AdminSessionController::new(h.auth.clone());
    let sid = sessions.login(&h.ctx.directory, "admin@x.com", "secret1").await.unwrap();

    assert!(sessions.selection(&sid).is_idle());
    assert!(sessions.select(&sid, Selection::Creating));
    assert!(sessions.select(&sid, Selection::Deleting(id.clone())));
    assert!(sessions.selection(&sid).is_deleting(&id));
    assert!(!sessions.selection(&sid).is_creating());

    sessions.clear_selection(&sid);
    assert!(sessions.selection(&sid).is_idle());
    assert!(!sessions.select("unknown", Selection::Creating));
}

#[tokio::test]
async fn bootstrap_admin_is_created_once() {
    let h = harness();
    assert!(ensure_bootstrap_admin(&h.ctx, "root@x.com", "secret1").await.unwrap());
    assert!(!ensure_bootstrap_admin(&h.ctx, "root@x.com", "secret1").await.unwrap());
    let users = h.ctx.directory.snapshot();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, Role::Admin);
}
