//! In-memory append-only ledger store.
//!
//! Reference implementation of the [`LedgerStore`] contract, used by tests
//! and dev setups. Each (tenant, period) book carries its own lock so
//! voucher allocation is a single atomic validate-allocate-commit step that
//! never serializes unrelated tenants or periods.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::NaiveDate;
use tracing::info;

use ledgerpilot_core::{AccountCode, DomainError, DomainResult, EntryId, Period, TenantId};

use crate::entry::{Entry, EntryLine, SourceType};
use crate::line::{Line, validate_lines};
use crate::store::{AccountBalance, LedgerStore};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct BookKey {
    tenant_id: TenantId,
    period: Period,
}

/// Entries and the voucher counter for one (tenant, period).
#[derive(Debug, Default)]
struct PeriodBook {
    next_voucher: u64,
    entries: Vec<Entry>,
}

impl PeriodBook {
    fn allocate_voucher(&mut self) -> u64 {
        self.next_voucher += 1;
        self.next_voucher
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    books: RwLock<HashMap<BookKey, Arc<Mutex<PeriodBook>>>>,
    /// Entry id → owning book, for reversal/get without scanning all books.
    index: Mutex<HashMap<EntryId, BookKey>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, key: BookKey) -> DomainResult<Arc<Mutex<PeriodBook>>> {
        // Fast path: the book already exists.
        {
            let books = self
                .books
                .read()
                .map_err(|_| DomainError::persistence("ledger books lock poisoned"))?;
            if let Some(book) = books.get(&key) {
                return Ok(Arc::clone(book));
            }
        }

        let mut books = self
            .books
            .write()
            .map_err(|_| DomainError::persistence("ledger books lock poisoned"))?;
        Ok(Arc::clone(books.entry(key).or_default()))
    }

    fn existing_book(&self, key: BookKey) -> DomainResult<Option<Arc<Mutex<PeriodBook>>>> {
        let books = self
            .books
            .read()
            .map_err(|_| DomainError::persistence("ledger books lock poisoned"))?;
        Ok(books.get(&key).map(Arc::clone))
    }

    fn locate(&self, tenant_id: TenantId, entry_id: EntryId) -> DomainResult<BookKey> {
        let index = self
            .index
            .lock()
            .map_err(|_| DomainError::persistence("ledger index lock poisoned"))?;
        match index.get(&entry_id) {
            // Tenant isolation: an id from another tenant does not exist here.
            Some(key) if key.tenant_id == tenant_id => Ok(*key),
            _ => Err(DomainError::not_found(format!("entry {entry_id}"))),
        }
    }

    fn register(&self, entry_id: EntryId, key: BookKey) -> DomainResult<()> {
        let mut index = self
            .index
            .lock()
            .map_err(|_| DomainError::persistence("ledger index lock poisoned"))?;
        index.insert(entry_id, key);
        Ok(())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn post(
        &self,
        tenant_id: TenantId,
        period: Period,
        date: NaiveDate,
        source: SourceType,
        lines: Vec<Line>,
    ) -> DomainResult<Entry> {
        // Validation precedes allocation: a rejected post must not consume
        // or skip a voucher number.
        validate_lines(&lines)?;

        let key = BookKey { tenant_id, period };
        let book = self.book(key)?;

        let entry = {
            let mut book = book
                .lock()
                .map_err(|_| DomainError::persistence("period book lock poisoned"))?;

            let entry = Entry {
                id: EntryId::new(),
                tenant_id,
                period,
                voucher_no: book.allocate_voucher(),
                date,
                source,
                lines: lines.into_iter().map(EntryLine::from).collect(),
                reversed: false,
                reversal_of: None,
            };
            book.entries.push(entry.clone());
            entry
        };

        self.register(entry.id, key)?;

        info!(
            tenant = %tenant_id,
            period = %period,
            voucher = entry.voucher_no,
            source = %source,
            "entry posted"
        );

        Ok(entry)
    }

    fn reverse(&self, tenant_id: TenantId, entry_id: EntryId) -> DomainResult<Entry> {
        let key = self.locate(tenant_id, entry_id)?;
        let book = self
            .existing_book(key)?
            .ok_or_else(|| DomainError::not_found(format!("entry {entry_id}")))?;

        let reversal = {
            let mut book = book
                .lock()
                .map_err(|_| DomainError::persistence("period book lock poisoned"))?;

            let original = book
                .entries
                .iter()
                .find(|e| e.id == entry_id)
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("entry {entry_id}")))?;

            if original.reversed {
                return Err(DomainError::conflict(format!(
                    "entry {entry_id} (voucher {}) is already reversed",
                    original.voucher_no
                )));
            }

            let reversal = Entry {
                id: EntryId::new(),
                tenant_id,
                period: key.period,
                voucher_no: book.allocate_voucher(),
                date: original.date,
                source: SourceType::Reversal,
                lines: original.lines.iter().map(EntryLine::swapped).collect(),
                reversed: false,
                reversal_of: Some(original.id),
            };

            // Flag flip and reversal commit happen under the same book lock,
            // so a concurrent second reverse observes the flag.
            if let Some(e) = book.entries.iter_mut().find(|e| e.id == entry_id) {
                e.reversed = true;
            }
            book.entries.push(reversal.clone());
            reversal
        };

        self.register(reversal.id, key)?;

        info!(
            tenant = %tenant_id,
            period = %key.period,
            original = %entry_id,
            voucher = reversal.voucher_no,
            "entry reversed"
        );

        Ok(reversal)
    }

    fn get(&self, tenant_id: TenantId, entry_id: EntryId) -> DomainResult<Entry> {
        let key = self.locate(tenant_id, entry_id)?;
        let book = self
            .existing_book(key)?
            .ok_or_else(|| DomainError::not_found(format!("entry {entry_id}")))?;
        let book = book
            .lock()
            .map_err(|_| DomainError::persistence("period book lock poisoned"))?;
        book.entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("entry {entry_id}")))
    }

    fn entries_for_period(&self, tenant_id: TenantId, period: Period) -> DomainResult<Vec<Entry>> {
        let key = BookKey { tenant_id, period };
        match self.existing_book(key)? {
            None => Ok(Vec::new()),
            Some(book) => {
                let book = book
                    .lock()
                    .map_err(|_| DomainError::persistence("period book lock poisoned"))?;
                Ok(book.entries.clone())
            }
        }
    }

    fn entries_for_account(
        &self,
        tenant_id: TenantId,
        period: Period,
        account: &AccountCode,
    ) -> DomainResult<Vec<Entry>> {
        Ok(self
            .entries_for_period(tenant_id, period)?
            .into_iter()
            .filter(|e| e.touches_account(account))
            .collect())
    }

    fn entries_in_voucher_range(
        &self,
        tenant_id: TenantId,
        period: Period,
        from: u64,
        to: u64,
    ) -> DomainResult<Vec<Entry>> {
        Ok(self
            .entries_for_period(tenant_id, period)?
            .into_iter()
            .filter(|e| e.voucher_no >= from && e.voucher_no <= to)
            .collect())
    }

    fn account_balance(
        &self,
        tenant_id: TenantId,
        period: Period,
        account: &AccountCode,
    ) -> DomainResult<AccountBalance> {
        let mut balance = AccountBalance {
            debit: 0,
            credit: 0,
        };
        for entry in self.entries_for_period(tenant_id, period)? {
            for line in entry.lines.iter().filter(|l| &l.account == account) {
                balance.debit += line.debit as i128;
                balance.credit += line.credit as i128;
            }
        }
        Ok(balance)
    }
}
