use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerpilot_core::{AccountCode, DomainResult, EntryId, Period, TenantId};

use crate::entry::{Entry, SourceType};
use crate::line::Line;

/// Debit/credit totals for one account over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub debit: i128,
    pub credit: i128,
}

impl AccountBalance {
    /// Net balance, debit-positive (saldo).
    pub fn net(&self) -> i128 {
        self.debit - self.credit
    }
}

/// Append-only, tenant-scoped ledger store.
///
/// Contract, binding for every implementation:
/// - `post` validates the balance invariant **before** allocating a voucher
///   number; a rejected post never consumes a number.
/// - Voucher numbers are strictly increasing and gap-free per
///   (tenant, period); allocation and commit are one atomic step, and posts
///   for different tenants or periods do not serialize against each other.
/// - Committed entries are immutable; the only follow-up is `reverse`,
///   exactly once per entry (second call is a conflict).
/// - Queries reflect committed entries only, never in-flight ones.
/// - Failures are returned, never retried internally; the caller owns the
///   retry/fallback policy.
pub trait LedgerStore: Send + Sync {
    /// Validate and commit a new entry, allocating the next voucher number.
    fn post(
        &self,
        tenant_id: TenantId,
        period: Period,
        date: NaiveDate,
        source: SourceType,
        lines: Vec<Line>,
    ) -> DomainResult<Entry>;

    /// Create the reversing entry for `entry_id` and flip its `reversed` flag.
    ///
    /// Errors: `NotFound` for an unknown id, `Conflict` if already reversed.
    fn reverse(&self, tenant_id: TenantId, entry_id: EntryId) -> DomainResult<Entry>;

    fn get(&self, tenant_id: TenantId, entry_id: EntryId) -> DomainResult<Entry>;

    /// All committed entries for a period, in voucher order.
    fn entries_for_period(&self, tenant_id: TenantId, period: Period) -> DomainResult<Vec<Entry>>;

    /// Committed entries touching `account` within a period, in voucher order.
    fn entries_for_account(
        &self,
        tenant_id: TenantId,
        period: Period,
        account: &AccountCode,
    ) -> DomainResult<Vec<Entry>>;

    /// Committed entries with `from <= voucher_no <= to`.
    fn entries_in_voucher_range(
        &self,
        tenant_id: TenantId,
        period: Period,
        from: u64,
        to: u64,
    ) -> DomainResult<Vec<Entry>>;

    /// Debit/credit totals for an account over a period (saldo query).
    fn account_balance(
        &self,
        tenant_id: TenantId,
        period: Period,
        account: &AccountCode,
    ) -> DomainResult<AccountBalance>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn post(
        &self,
        tenant_id: TenantId,
        period: Period,
        date: NaiveDate,
        source: SourceType,
        lines: Vec<Line>,
    ) -> DomainResult<Entry> {
        (**self).post(tenant_id, period, date, source, lines)
    }

    fn reverse(&self, tenant_id: TenantId, entry_id: EntryId) -> DomainResult<Entry> {
        (**self).reverse(tenant_id, entry_id)
    }

    fn get(&self, tenant_id: TenantId, entry_id: EntryId) -> DomainResult<Entry> {
        (**self).get(tenant_id, entry_id)
    }

    fn entries_for_period(&self, tenant_id: TenantId, period: Period) -> DomainResult<Vec<Entry>> {
        (**self).entries_for_period(tenant_id, period)
    }

    fn entries_for_account(
        &self,
        tenant_id: TenantId,
        period: Period,
        account: &AccountCode,
    ) -> DomainResult<Vec<Entry>> {
        (**self).entries_for_account(tenant_id, period, account)
    }

    fn entries_in_voucher_range(
        &self,
        tenant_id: TenantId,
        period: Period,
        from: u64,
        to: u64,
    ) -> DomainResult<Vec<Entry>> {
        (**self).entries_in_voucher_range(tenant_id, period, from, to)
    }

    fn account_balance(
        &self,
        tenant_id: TenantId,
        period: Period,
        account: &AccountCode,
    ) -> DomainResult<AccountBalance> {
        (**self).account_balance(tenant_id, period, account)
    }
}
