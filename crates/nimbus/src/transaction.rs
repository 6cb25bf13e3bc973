use nimbus_proto::legacy;

///
/// Transaction
///
/// Handle of an open transaction as issued by the service.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Transaction {
    handle: u64,
    app_id: String,
}

impl Transaction {
    #[must_use]
    pub fn new(handle: u64, app_id: impl Into<String>) -> Self {
        Self {
            handle,
            app_id: app_id.into(),
        }
    }

    #[must_use]
    pub const fn handle(&self) -> u64 {
        self.handle
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub(crate) fn to_wire(&self) -> legacy::Transaction {
        legacy::Transaction {
            handle: self.handle,
            app: self.app_id.clone(),
        }
    }

    pub(crate) fn from_wire(wire: legacy::Transaction) -> Self {
        Self::new(wire.handle, wire.app)
    }
}

///
/// TransactionContext
///
/// Caller-owned stack of nested open transactions. The innermost one is
/// current. A context belongs to one logical flow of work; it is not shared.
///

#[derive(Debug, Default)]
pub struct TransactionContext {
    stack: Vec<Transaction>,
}

impl TransactionContext {
    #[must_use]
    pub const fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn begin(&mut self, txn: Transaction) {
        self.stack.push(txn);
    }

    #[must_use]
    pub fn current(&self) -> Option<&Transaction> {
        self.stack.last()
    }

    /// Pop the current transaction for commit or rollback.
    pub fn finish(&mut self) -> Option<Transaction> {
        self.stack.pop()
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.stack.is_empty()
    }
}

///
/// TESTS
///
