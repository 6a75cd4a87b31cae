//! Integration tests for the table and form controllers, driven end-to-end
//! against a scripted in-process HTTP stub.
//!
//! The stub records every request it receives, so the tests can assert not
//! just on rendered output but on what went over the wire — in particular
//! that incomplete drafts and declined confirmations never reach the
//! network, and that successful mutations are followed by a reload.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Response, Server};

use domo::api::ApiClient;
use domo::form::{DraftSource, FormController, SubmitOutcome};
use domo::model::{FieldSpec, Housing, Record, Sensor};
use domo::table::{
    DeleteOutcome, Interaction, MISSING_VALUE, RenderTarget, TableController, TableSnapshot,
    TableView,
};

// ---------------------------------------------------------------------------
// Scripted HTTP stub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    body: String,
}

struct StubApi {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubApi {
    /// Start a stub server; `handler(method, path, body)` decides the status
    /// and body of every response.
    fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &str, &str) -> (u16, String) + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("failed to bind stub server");
        let addr = server.server_addr().to_ip().expect("expected an IP listener");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let method = request.method().to_string();
                let path = request.url().to_string();
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                recorded.lock().unwrap().push(RecordedRequest {
                    method: method.clone(),
                    path: path.clone(),
                    body: body.clone(),
                });

                let (status, response_body) = handler(&method, &path, &body);
                let _ = request.respond(
                    Response::from_string(response_body).with_status_code(status),
                );
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, 2_000)
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// Test doubles for the terminal bindings
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    snapshots: Vec<TableSnapshot>,
}

impl RenderTarget for Recorder {
    fn replace(&mut self, snapshot: &TableSnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}

struct Scripted {
    accept: bool,
    notices: Vec<String>,
}

impl Scripted {
    fn accepting() -> Self {
        Self { accept: true, notices: Vec::new() }
    }

    fn declining() -> Self {
        Self { accept: false, notices: Vec::new() }
    }
}

impl Interaction for Scripted {
    fn confirm(&mut self, _question: &str) -> bool {
        self.accept
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

struct Preset(Vec<(&'static str, &'static str)>);

impl DraftSource for Preset {
    fn value(&mut self, field: &FieldSpec) -> String {
        self.0
            .iter()
            .find(|(key, _)| *key == field.key)
            .map(|(_, value)| (*value).to_string())
            .unwrap_or_default()
    }
}

const SENSORS_JSON: &str = r#"[
    {"id": 1, "type": "thermometre", "port_communication": "COM3",
     "reference_commerciale": "DHT11", "id_piece": 2},
    {"id": 2, "type": null, "port_communication": "",
     "reference_commerciale": "AM2302", "id_piece": null}
]"#;

// ---------------------------------------------------------------------------
// Reload
// ---------------------------------------------------------------------------

#[test]
fn reload_renders_one_row_per_record_in_server_order() {
    let stub = StubApi::start(|_, _, _| (200, SENSORS_JSON.to_string()));
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);

    table.reload();

    assert_eq!(target.snapshots.len(), 1);
    let snapshot = &target.snapshots[0];
    assert_eq!(snapshot.columns, Sensor::COLUMNS);
    assert_eq!(snapshot.generation, 1);

    let TableView::Rows(rows) = &snapshot.view else {
        panic!("expected rows, got {:?}", snapshot.view);
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "1");
    assert_eq!(rows[1].id, "2");
    // Absent and empty fields render as the fallback.
    assert_eq!(rows[1].cells[1], MISSING_VALUE);
    assert_eq!(rows[1].cells[2], MISSING_VALUE);
    assert_eq!(rows[1].cells[4], MISSING_VALUE);
}

#[test]
fn reload_twice_renders_identical_views() {
    let stub = StubApi::start(|_, _, _| (200, SENSORS_JSON.to_string()));
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);

    table.reload();
    table.reload();

    assert_eq!(target.snapshots.len(), 2);
    assert_eq!(target.snapshots[0].view, target.snapshots[1].view);
    assert_eq!(target.snapshots[0].generation, 1);
    assert_eq!(target.snapshots[1].generation, 2);
}

#[test]
fn empty_collection_renders_single_placeholder_row() {
    let stub = StubApi::start(|_, _, _| (200, "[]".to_string()));
    let client = stub.client();
    let mut target = Recorder::default();
    TableController::<Sensor>::new(&client, &mut target).reload();

    assert_eq!(
        target.snapshots[0].view,
        TableView::Empty("No sensors found.".to_string())
    );
}

#[test]
fn server_error_renders_single_error_row() {
    let stub = StubApi::start(|_, _, _| (500, r#"{"error":"boom"}"#.to_string()));
    let client = stub.client();
    let mut target = Recorder::default();
    TableController::<Sensor>::new(&client, &mut target).reload();

    assert_eq!(
        target.snapshots[0].view,
        TableView::Failed("Could not load sensors.".to_string())
    );
}

#[test]
fn non_json_body_renders_error_row_instead_of_escaping() {
    let stub = StubApi::start(|_, _, _| (200, "<html>oops</html>".to_string()));
    let client = stub.client();
    let mut target = Recorder::default();
    TableController::<Sensor>::new(&client, &mut target).reload();

    assert!(matches!(target.snapshots[0].view, TableView::Failed(_)));
}

#[test]
fn unreachable_server_renders_error_row() {
    // Nothing listens on port 9.
    let client = ApiClient::new("http://127.0.0.1:9", 200);
    let mut target = Recorder::default();
    TableController::<Housing>::new(&client, &mut target).reload();

    assert_eq!(
        target.snapshots[0].view,
        TableView::Failed("Could not load housing units.".to_string())
    );
}

#[test]
fn housing_rows_are_keyed_by_id_logement() {
    let stub = StubApi::start(|_, _, _| {
        (
            200,
            r#"[{"id_logement": 3, "adresse": "12 rue des Lilas",
                 "numero_telephone": "0102030405", "adresse_ip": "192.168.1.10",
                 "date_insertion": "2024-11-02 10:15:00"}]"#
                .to_string(),
        )
    });
    let client = stub.client();
    let mut target = Recorder::default();
    TableController::<Housing>::new(&client, &mut target).reload();

    let TableView::Rows(rows) = &target.snapshots[0].view else {
        panic!("expected rows");
    };
    assert_eq!(rows[0].id, "3");
    assert_eq!(rows[0].cells[1], "12 rue des Lilas");
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn declined_confirmation_sends_nothing() {
    let stub = StubApi::start(|_, _, _| (200, "[]".to_string()));
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);
    let mut ui = Scripted::declining();

    let outcome = table.delete("4", &mut ui);

    assert_eq!(outcome, DeleteOutcome::Declined);
    assert!(stub.requests().is_empty(), "no request may be issued on decline");
    assert!(target.snapshots.is_empty());
}

#[test]
fn accepted_delete_surfaces_message_then_reloads() {
    let stub = StubApi::start(|method, path, _| match (method, path) {
        ("DELETE", "/api/capteurs/4") => {
            (200, r#"{"message":"Capteur supprimé avec succès!"}"#.to_string())
        }
        ("GET", "/api/capteurs") => (200, "[]".to_string()),
        _ => (404, r#"{"error":"not found"}"#.to_string()),
    });
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);
    let mut ui = Scripted::accepting();

    let outcome = table.delete("4", &mut ui);

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(ui.notices, vec!["Capteur supprimé avec succès!"]);

    // The DELETE is followed by a full resync of the collection, even though
    // the row is already known gone.
    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/api/capteurs/4");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, "/api/capteurs");
    assert_eq!(target.snapshots.len(), 1);
}

#[test]
fn rejected_delete_keeps_table_untouched() {
    let stub = StubApi::start(|method, _, _| {
        if method == "DELETE" {
            (409, r#"{"error":"capteur introuvable"}"#.to_string())
        } else {
            (200, SENSORS_JSON.to_string())
        }
    });
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);
    let mut ui = Scripted::accepting();

    let outcome = table.delete("99", &mut ui);

    assert_eq!(outcome, DeleteOutcome::Rejected);
    assert_eq!(ui.notices, vec!["Error: capteur introuvable"]);
    // No reload: the collection did not change.
    assert_eq!(stub.requests().len(), 1);
    assert!(target.snapshots.is_empty());
}

#[test]
fn transport_failure_during_delete_surfaces_generic_notice() {
    let client = ApiClient::new("http://127.0.0.1:9", 200);
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);
    let mut ui = Scripted::accepting();

    let outcome = table.delete("4", &mut ui);

    assert_eq!(outcome, DeleteOutcome::Failed);
    assert_eq!(ui.notices, vec!["Could not delete the sensor."]);
    assert!(target.snapshots.is_empty());
}

// ---------------------------------------------------------------------------
// Form submission
// ---------------------------------------------------------------------------

#[test]
fn submit_posts_wire_keys_and_reloads_paired_table() {
    let stub = StubApi::start(|method, path, _| match (method, path) {
        ("POST", "/api/capteurs") => (201, r#"{"message":"Capteur ajouté"}"#.to_string()),
        ("GET", "/api/capteurs") => (200, SENSORS_JSON.to_string()),
        _ => (404, r#"{"error":"not found"}"#.to_string()),
    });
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);
    let form = FormController::<Sensor>::new(&client);
    let mut ui = Scripted::accepting();

    let mut source = Preset(vec![
        ("type", "  thermometre "),
        ("port_communication", "COM7"),
        ("reference_commerciale", "DHT22"),
        ("id_piece", "3"),
    ]);
    let outcome = form.submit(&mut source, &mut ui, &mut table);

    assert_eq!(outcome, SubmitOutcome::Created("Capteur ajouté".to_string()));
    assert_eq!(ui.notices, vec!["Capteur ajouté"]);

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");

    // Draft keyed by wire field names, values trimmed.
    let draft: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(draft["type"], "thermometre");
    assert_eq!(draft["port_communication"], "COM7");
    assert_eq!(draft["reference_commerciale"], "DHT22");
    assert_eq!(draft["id_piece"], "3");

    // Paired table resynced: the render shows what the server now returns.
    assert_eq!(requests[1].method, "GET");
    assert!(matches!(&target.snapshots[0].view, TableView::Rows(rows) if rows.len() == 2));
}

#[test]
fn rejected_submit_surfaces_error_and_skips_reload() {
    let stub = StubApi::start(|method, _, _| {
        if method == "POST" {
            (409, r#"{"error":"port déjà utilisé"}"#.to_string())
        } else {
            (200, "[]".to_string())
        }
    });
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Sensor>::new(&client, &mut target);
    let form = FormController::<Sensor>::new(&client);
    let mut ui = Scripted::accepting();

    let mut source = Preset(vec![
        ("type", "thermometre"),
        ("port_communication", "COM3"),
        ("reference_commerciale", "DHT11"),
        ("id_piece", "2"),
    ]);
    let outcome = form.submit(&mut source, &mut ui, &mut table);

    assert_eq!(outcome, SubmitOutcome::Rejected("port déjà utilisé".to_string()));
    assert_eq!(ui.notices, vec!["Error: port déjà utilisé"]);
    assert_eq!(stub.requests().len(), 1, "no reload after a rejected POST");
    assert!(target.snapshots.is_empty());
}

#[test]
fn incomplete_draft_never_reaches_the_network() {
    let stub = StubApi::start(|_, _, _| (200, "[]".to_string()));
    let client = stub.client();
    let mut target = Recorder::default();
    let mut table = TableController::<Housing>::new(&client, &mut target);
    let form = FormController::<Housing>::new(&client);
    let mut ui = Scripted::accepting();

    let mut source = Preset(vec![("adresse", "12 rue des Lilas"), ("adresse_ip", "  ")]);
    let outcome = form.submit(&mut source, &mut ui, &mut table);

    let SubmitOutcome::Incomplete(missing) = outcome else {
        panic!("expected Incomplete");
    };
    assert_eq!(missing, vec!["Phone number", "IP address"]);
    assert_eq!(ui.notices, vec!["Please fill in all required fields."]);
    assert!(stub.requests().is_empty());
}

// ---------------------------------------------------------------------------
// Aggregate endpoints
// ---------------------------------------------------------------------------

#[test]
fn savings_fetch_carries_the_wire_scale_parameter() {
    let stub = StubApi::start(|_, _, _| {
        (200, r#"[{"type":"Eau","economie":4.5}]"#.to_string())
    });
    let client = stub.client();

    let rows = client
        .aggregates("/api/economies", &[("scale", "Mensuel")])
        .unwrap();

    assert_eq!(rows.len(), 1);
    let requests = stub.requests();
    assert_eq!(requests[0].path, "/api/economies?scale=Mensuel");
}
