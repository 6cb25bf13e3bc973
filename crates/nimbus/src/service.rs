use crate::{
    config::DatastoreConfig,
    error::DatastoreError,
    rpc::ApiProxy,
    transaction::{Transaction, TransactionContext},
};
use nimbus_core::{
    AppContext, ErrorClass, ErrorOrigin, InternalError,
    entity::Entity,
    key::Key,
    query::{Cursor, PreparedQuery, Query, normalize, prepare, prepare_legacy, validate},
    translate::{
        LegacyCodec, Protocol, TranslateOptions, Translator, WireCodec,
        key::{key_to_reference, reference_to_key},
    },
};
use nimbus_proto::{Message, legacy};
use std::future::Future;
use tracing::debug;

///
/// CONSTANTS
///

/// Service name every request is addressed to.
pub const SERVICE_NAME: &str = "datastore_v3";

///
/// QueryResults
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResults {
    pub entities: Vec<Entity>,
    pub cursor: Option<Cursor>,
    pub more_results: bool,
    pub keys_only: bool,
}

///
/// DatastoreService
///
/// Datastore client over an [`ApiProxy`]. Requests use the legacy protocol
/// messages; the configured protocol only selects the entity translator and
/// the query form returned by [`Self::prepare`].
///

pub struct DatastoreService<P> {
    proxy: P,
    context: AppContext,
    codec: LegacyCodec,
    translator: Translator,
}

impl<P: ApiProxy> DatastoreService<P> {
    #[must_use]
    pub fn new(
        proxy: P,
        context: AppContext,
        protocol: Protocol,
        options: TranslateOptions,
    ) -> Self {
        Self {
            proxy,
            translator: Translator::new(protocol, options, context.clone()),
            codec: LegacyCodec::new(options),
            context,
        }
    }

    #[must_use]
    pub fn from_config(proxy: P, config: &DatastoreConfig) -> Self {
        Self::new(
            proxy,
            config.context(),
            config.protocol,
            config.translate_options(),
        )
    }

    #[must_use]
    pub const fn context(&self) -> &AppContext {
        &self.context
    }

    /// Entity translator for the configured protocol.
    #[must_use]
    pub const fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Normalize, validate and build `query` for the configured protocol.
    pub fn prepare(&self, query: &Query) -> Result<PreparedQuery, DatastoreError> {
        Ok(prepare(query, self.translator.protocol(), &self.context)?)
    }

    /// Fetch entities by key. Missing entities come back as `None`, in
    /// request order.
    pub fn get(
        &self,
        txn: Option<&Transaction>,
        keys: &[Key],
    ) -> Result<Vec<Option<Entity>>, DatastoreError> {
        let response: legacy::GetResponse = self.call("Get", &get_request(txn, keys))?;

        decode_get(self.codec, response)
    }

    /// Like [`Self::get`], but the request is dispatched before this returns
    /// and the future only owns the pending reply.
    pub fn get_async(
        &self,
        txn: Option<&Transaction>,
        keys: &[Key],
    ) -> impl Future<Output = Result<Vec<Option<Entity>>, DatastoreError>> + Send + use<P> {
        debug!(service = SERVICE_NAME, method = "Get", keys = keys.len(), "async rpc dispatch");

        let pending = self.proxy.make_async_call(
            SERVICE_NAME,
            "Get",
            get_request(txn, keys).encode_to_vec(),
        );
        let codec = self.codec;

        async move {
            let bytes = pending.await?;
            let response = legacy::GetResponse::decode(bytes.as_slice())?;

            decode_get(codec, response)
        }
    }

    pub fn run_query(
        &self,
        txn: Option<&Transaction>,
        query: &Query,
    ) -> Result<QueryResults, DatastoreError> {
        let query = normalize(&query.with_distinct_promoted());
        validate(&query)?;

        let mut request = prepare_legacy(&query)?;
        request.transaction = txn.map(Transaction::to_wire);

        let response: legacy::QueryResult = self.call("RunQuery", &request)?;
        let entities = response
            .result
            .iter()
            .map(|wire| self.codec.decode_entity(wire))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResults {
            entities,
            cursor: response.cursor.map(Cursor::new),
            more_results: response.more_results,
            keys_only: response.keys_only,
        })
    }

    /// Store entities. Incomplete keys are completed in place with the ids
    /// the service allocated; the stored keys are returned in order.
    pub fn put(
        &self,
        txn: Option<&Transaction>,
        entities: &mut [Entity],
    ) -> Result<Vec<Key>, DatastoreError> {
        let request = legacy::PutRequest {
            entity: entities
                .iter()
                .map(|e| self.codec.encode_entity(e))
                .collect::<Result<Vec<_>, _>>()?,
            transaction: txn.map(Transaction::to_wire),
        };

        let response: legacy::PutResponse = self.call("Put", &request)?;
        if response.key.len() != entities.len() {
            return Err(InternalError::new(
                ErrorClass::Corruption,
                ErrorOrigin::Serialize,
                format!(
                    "put returned {} keys for {} entities",
                    response.key.len(),
                    entities.len()
                ),
            )
            .into());
        }

        for (entity, reference) in entities.iter_mut().zip(&response.key) {
            if entity.key().is_complete() {
                continue;
            }
            if let Some(id) = reference_to_key(reference)?.id() {
                entity.complete_key(id)?;
            }
        }

        Ok(entities.iter().map(|e| e.key().clone()).collect())
    }

    pub fn delete(&self, txn: Option<&Transaction>, keys: &[Key]) -> Result<(), DatastoreError> {
        let request = legacy::DeleteRequest {
            key: keys.iter().map(key_to_reference).collect(),
            transaction: txn.map(Transaction::to_wire),
        };

        let _: legacy::VoidProto = self.call("Delete", &request)?;

        Ok(())
    }

    /// Open a transaction and make it current in `ctx`.
    pub fn begin_transaction(
        &self,
        ctx: &mut TransactionContext,
    ) -> Result<Transaction, DatastoreError> {
        let request = legacy::BeginTransactionRequest {
            app: self.context.app_id.clone(),
            allow_multiple_eg: false,
        };

        let response: legacy::Transaction = self.call("BeginTransaction", &request)?;
        let txn = Transaction::from_wire(response);
        ctx.begin(txn.clone());

        Ok(txn)
    }

    /// Commit the current transaction of `ctx`. It is popped even when the
    /// commit fails.
    pub fn commit(&self, ctx: &mut TransactionContext) -> Result<(), DatastoreError> {
        let txn = ctx.finish().ok_or(DatastoreError::NoActiveTransaction)?;
        let _: legacy::VoidProto = self.call("Commit", &txn.to_wire())?;

        Ok(())
    }

    pub fn rollback(&self, ctx: &mut TransactionContext) -> Result<(), DatastoreError> {
        let txn = ctx.finish().ok_or(DatastoreError::NoActiveTransaction)?;
        let _: legacy::VoidProto = self.call("Rollback", &txn.to_wire())?;

        Ok(())
    }

    fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, DatastoreError>
    where
        Req: Message,
        Resp: Message + Default,
    {
        debug!(service = SERVICE_NAME, method, "rpc dispatch");

        let bytes = self
            .proxy
            .make_sync_call(SERVICE_NAME, method, &request.encode_to_vec())?;

        Ok(Resp::decode(bytes.as_slice())?)
    }
}

fn get_request(txn: Option<&Transaction>, keys: &[Key]) -> legacy::GetRequest {
    legacy::GetRequest {
        key: keys.iter().map(key_to_reference).collect(),
        transaction: txn.map(Transaction::to_wire),
    }
}

fn decode_get(
    codec: LegacyCodec,
    response: legacy::GetResponse,
) -> Result<Vec<Option<Entity>>, DatastoreError> {
    response
        .entity
        .iter()
        .map(|slot| {
            slot.entity
                .as_ref()
                .map(|wire| codec.decode_entity(wire))
                .transpose()
                .map_err(DatastoreError::from)
        })
        .collect()
}
