//! Service calls against an in-memory proxy.

use futures::{FutureExt, executor::block_on, future};
use nimbus::{
    DatastoreConfig, DatastoreError, DatastoreService, TransactionContext,
    prelude::*,
    query::{IllegalQueryType, PreparedQuery},
    rpc::{ApiProxy, RpcError, RpcFuture},
    service::SERVICE_NAME,
    translate::{LegacyCodec, TranslateOptions, WireCodec, key::key_to_reference},
};
use nimbus_proto::{Message, legacy};
use std::{collections::VecDeque, sync::Mutex};

///
/// FakeProxy
///
/// Replays queued replies and records every request.
///

#[derive(Default)]
struct FakeProxy {
    replies: Mutex<VecDeque<Result<Vec<u8>, RpcError>>>,
    calls: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FakeProxy {
    fn reply(&self, message: &impl Message) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(message.encode_to_vec()));
    }

    fn fail(&self, err: RpcError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    fn next(&self, service: &str, method: &str, request: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((service.to_string(), method.to_string(), request));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no reply queued")
    }

    fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, method, _)| method.clone())
            .collect()
    }

    fn last_request<M: Message + Default>(&self) -> M {
        let calls = self.calls.lock().unwrap();
        let (service, _, bytes) = calls.last().expect("no call made");
        assert_eq!(service, SERVICE_NAME);

        M::decode(bytes.as_slice()).unwrap()
    }
}

impl ApiProxy for FakeProxy {
    fn make_sync_call(
        &self,
        service: &str,
        method: &str,
        request: &[u8],
    ) -> Result<Vec<u8>, RpcError> {
        self.next(service, method, request.to_vec())
    }

    fn make_async_call(&self, service: &str, method: &str, request: Vec<u8>) -> RpcFuture {
        future::ready(self.next(service, method, request)).boxed()
    }
}

fn context() -> AppContext {
    AppContext::new("s~shop", "shop")
}

fn service(proxy: &FakeProxy) -> DatastoreService<&FakeProxy> {
    DatastoreService::new(
        proxy,
        context(),
        Protocol::Legacy,
        TranslateOptions::default(),
    )
}

fn alice() -> Entity {
    let key = Key::with_name(context().scope(), "Person", "alice").unwrap();
    let mut entity = Entity::new(key);
    entity.set_property("age", 30).unwrap();
    entity
}

fn wire(entity: &Entity) -> legacy::EntityProto {
    LegacyCodec::default().encode_entity(entity).unwrap()
}

#[test]
fn put_assigns_allocated_ids() {
    let proxy = FakeProxy::default();
    let allocated = Key::with_id(context().scope(), "Person", 42).unwrap();
    proxy.reply(&legacy::PutResponse {
        key: vec![key_to_reference(&allocated), key_to_reference(alice().key())],
    });

    let mut entities = vec![
        Entity::new(Key::incomplete(context().scope(), "Person").unwrap()),
        alice(),
    ];
    let keys = service(&proxy).put(None, &mut entities).unwrap();

    assert_eq!(entities[0].key().id(), Some(42));
    assert!(entities[0].key().is_complete());
    assert_eq!(keys, [allocated, alice().key().clone()]);

    let request: legacy::PutRequest = proxy.last_request();
    assert_eq!(request.entity.len(), 2);
    assert!(request.transaction.is_none());
}

#[test]
fn put_with_short_response_is_corruption() {
    let proxy = FakeProxy::default();
    proxy.reply(&legacy::PutResponse { key: Vec::new() });

    let err = service(&proxy).put(None, &mut [alice()]).unwrap_err();

    assert!(matches!(
        err,
        DatastoreError::Core(inner) if inner.class == nimbus_core::ErrorClass::Corruption
    ));
}

#[test]
fn get_keeps_request_order_and_missing_slots() {
    let proxy = FakeProxy::default();
    proxy.reply(&legacy::GetResponse {
        entity: vec![
            legacy::GetResponseEntity {
                entity: Some(wire(&alice())),
                key: None,
            },
            legacy::GetResponseEntity {
                entity: None,
                key: None,
            },
        ],
    });

    let missing = Key::with_name(context().scope(), "Person", "bob").unwrap();
    let found = service(&proxy)
        .get(None, &[alice().key().clone(), missing])
        .unwrap();

    assert_eq!(found, [Some(alice()), None]);

    let request: legacy::GetRequest = proxy.last_request();
    assert_eq!(request.key.len(), 2);
}

#[test]
fn get_async_resolves_through_proxy_future() {
    let proxy = FakeProxy::default();
    proxy.reply(&legacy::GetResponse {
        entity: vec![legacy::GetResponseEntity {
            entity: Some(wire(&alice())),
            key: None,
        }],
    });

    let pending = service(&proxy).get_async(None, &[alice().key().clone()]);
    let found = block_on(pending).unwrap();

    assert_eq!(found, [Some(alice())]);
    assert_eq!(proxy.methods(), ["Get"]);
}

#[test]
fn run_query_sends_prepared_legacy_query() {
    let proxy = FakeProxy::default();
    proxy.reply(&legacy::QueryResult {
        cursor: Some(vec![1, 2]),
        result: vec![wire(&alice())],
        more_results: true,
        keys_only: false,
    });

    let query = Query::new(context().scope(), "Person")
        .filter(Filter::gt("age", 25))
        .order(SortOrder::asc("age"));
    let results = service(&proxy).run_query(None, &query).unwrap();

    assert_eq!(results.entities, [alice()]);
    assert_eq!(results.cursor, Some(Cursor::new(vec![1, 2])));
    assert!(results.more_results);

    let request: legacy::Query = proxy.last_request();
    assert_eq!(request.kind.as_deref(), Some("Person"));
    assert_eq!(request.filter.len(), 1);
    assert_eq!(proxy.methods(), ["RunQuery"]);
}

#[test]
fn invalid_query_never_reaches_the_proxy() {
    let proxy = FakeProxy::default();
    let query = Query::new(context().scope(), "Person").filter(Filter::ne("age", 1));

    let err = service(&proxy).run_query(None, &query).unwrap_err();

    assert_eq!(
        err.illegal_query_type(),
        Some(IllegalQueryType::UnsupportedFilter)
    );
    assert!(proxy.methods().is_empty());
}

#[test]
fn rejected_query_keeps_its_reason_tag() {
    let proxy = FakeProxy::default();
    let query = Query::new(context().scope(), "Person")
        .filter(Filter::gt("age", 25))
        .order(SortOrder::asc("name"));
    let svc = service(&proxy);

    for err in [
        svc.run_query(None, &query).unwrap_err(),
        svc.prepare(&query).unwrap_err(),
    ] {
        assert_eq!(
            err.illegal_query_type(),
            Some(IllegalQueryType::FirstSortNotInequalityProperty)
        );
    }
    assert!(proxy.methods().is_empty());
}

#[test]
fn application_errors_are_translated() {
    let proxy = FakeProxy::default();
    proxy.fail(RpcError::Application {
        service: SERVICE_NAME.to_string(),
        code: 4,
        detail: Some("composite index required".to_string()),
    });

    let err = service(&proxy)
        .get(None, &[alice().key().clone()])
        .unwrap_err();

    assert!(matches!(err, DatastoreError::NeedIndex(d) if d.contains("composite")));
}

#[test]
fn transaction_flow() {
    let proxy = FakeProxy::default();
    let svc = service(&proxy);
    let mut ctx = TransactionContext::new();

    proxy.reply(&legacy::Transaction {
        handle: 9,
        app: "s~shop".to_string(),
    });
    let txn = svc.begin_transaction(&mut ctx).unwrap();
    assert_eq!(txn.handle(), 9);
    assert_eq!(ctx.current(), Some(&txn));

    proxy.reply(&legacy::VoidProto {});
    svc.delete(ctx.current(), &[alice().key().clone()]).unwrap();
    let request: legacy::DeleteRequest = proxy.last_request();
    assert_eq!(request.transaction.map(|t| t.handle), Some(9));

    proxy.reply(&legacy::VoidProto {});
    svc.commit(&mut ctx).unwrap();
    assert!(!ctx.is_active());

    assert!(matches!(
        svc.rollback(&mut ctx),
        Err(DatastoreError::NoActiveTransaction)
    ));
    assert_eq!(proxy.methods(), ["BeginTransaction", "Delete", "Commit"]);
}

#[test]
fn configured_protocol_selects_prepared_form() {
    let proxy = FakeProxy::default();
    let config = DatastoreConfig::from_toml_str(
        r#"
        protocol = "public"

        [app]
        app_id = "s~shop"
        project_id = "shop"
        "#,
    )
    .unwrap();
    let svc = DatastoreService::from_config(&proxy, &config);

    let prepared = svc
        .prepare(&Query::new(svc.context().scope(), "Person"))
        .unwrap();

    assert!(matches!(prepared, PreparedQuery::Public(ref r) if r.project_id == "shop"));
    assert_eq!(svc.translator().protocol(), Protocol::Public);
}
