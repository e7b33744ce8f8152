//! End-to-end client flows against the in-memory and SQLite backends.

use std::sync::Arc;

use chrono::NaiveDate;
use mock_backend::{FailingStore, MemoryProfileCache, MemoryStore, MockAuth, DEFAULT_CODE};
use rakto_client::{
    BloodRequestForm, ClientConfig, ClientError, DonorRegistrationForm, DonorService, RaktoClient,
};
use rakto_core::{
    encode_fields, AuthIdentity, AuthProvider, BloodGroup, BloodRequest, Collection,
    DocumentStore, DonorFilter, DonorProfile, Gender, NewDonor, Record, RequestStatus,
};
use rakto_database::{Database, LocalProfileCache};

const BLOOD_GROUPS: [BloodGroup; 2] = [BloodGroup::ONegative, BloodGroup::APositive];
const CITIES: [&str; 2] = ["Dhaka", "Khulna"];
const STATES: [&str; 2] = ["Dhaka Division", "Khulna Division"];

fn new_donor(n: usize, blood_group: BloodGroup, city: &str, state: &str, available: bool) -> NewDonor {
    NewDonor {
        user_id: format!("uid-{}", n),
        name: format!("Donor {}", n),
        phone_number: format!("+88017000000{:02}", n),
        blood_group,
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        gender: Gender::Other,
        address: "Road 1".to_string(),
        city: city.to_string(),
        state: state.to_string(),
        pincode: "12000".to_string(),
        location: None,
        is_available: available,
        last_donation_date: None,
        next_available_date: None,
        emergency_contact: None,
    }
}

/// Every combination of group/city/state/availability, inserted in a mixed order.
async fn seed_donors(store: &dyn DocumentStore) {
    let mut n = 0;
    for available in [true, false] {
        for state in STATES {
            for blood_group in BLOOD_GROUPS {
                for city in CITIES {
                    let donor = new_donor(n, blood_group, city, state, available);
                    store
                        .create(Collection::Donors, encode_fields(&donor).unwrap())
                        .await
                        .unwrap();
                    n += 1;
                }
            }
        }
    }
}

fn options<T: Copy>(values: [T; 2]) -> [Option<T>; 3] {
    [None, Some(values[0]), Some(values[1])]
}

async fn check_filters_against_brute_force(store: Arc<dyn DocumentStore>) {
    seed_donors(store.as_ref()).await;
    let service = DonorService::new(store);
    let all = service.search_all().await.unwrap();
    assert_eq!(all.len(), 16);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let mut combinations = 0;
    for blood_group in options(BLOOD_GROUPS) {
        for city in options(CITIES) {
            for state in options(STATES) {
                for available in options([true, false]) {
                    let mut filter = DonorFilter::new();
                    if let Some(blood_group) = blood_group {
                        filter = filter.blood_group(blood_group);
                    }
                    if let Some(city) = city {
                        filter = filter.city(city);
                    }
                    if let Some(state) = state {
                        filter = filter.state(state);
                    }
                    if let Some(available) = available {
                        filter = filter.available(available);
                    }

                    let expected: Vec<&DonorProfile> = all
                        .iter()
                        .filter(|d| blood_group.map_or(true, |v| d.blood_group == v))
                        .filter(|d| city.map_or(true, |v| d.city == v))
                        .filter(|d| state.map_or(true, |v| d.state == v))
                        .filter(|d| available.map_or(true, |v| d.is_available == v))
                        .collect();
                    let actual = service.search(&filter).await.unwrap();

                    assert_eq!(
                        actual.iter().collect::<Vec<_>>(),
                        expected,
                        "filter {:?}",
                        filter
                    );
                    combinations += 1;
                }
            }
        }
    }
    assert_eq!(combinations, 81);
}

#[tokio::test]
async fn test_every_filter_combination_matches_brute_force_in_memory() {
    check_filters_against_brute_force(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_every_filter_combination_matches_brute_force_sqlite() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    check_filters_against_brute_force(Arc::new(db)).await;
}

#[tokio::test]
async fn test_blank_filter_text_is_ignored() {
    let store = Arc::new(MemoryStore::new());
    seed_donors(store.as_ref()).await;
    let service = DonorService::new(store);

    let results = service
        .search(&DonorFilter::new().city("  ").state(""))
        .await
        .unwrap();
    assert_eq!(results.len(), 16);
}

#[tokio::test]
async fn test_o_negative_in_dhaka_scenario() {
    let store = Arc::new(MemoryStore::new());
    let dhaka = store
        .create(
            Collection::Donors,
            encode_fields(&new_donor(1, BloodGroup::ONegative, "Dhaka", "Dhaka Division", true)).unwrap(),
        )
        .await
        .unwrap();
    store
        .create(
            Collection::Donors,
            encode_fields(&new_donor(2, BloodGroup::ONegative, "Rajshahi", "Rajshahi Division", true)).unwrap(),
        )
        .await
        .unwrap();

    let results = DonorService::new(store)
        .search(&DonorFilter::new().blood_group(BloodGroup::ONegative).city("Dhaka"))
        .await
        .unwrap();
    let ids: Vec<String> = results.into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![dhaka.id]);
}

struct Harness {
    store: Arc<FailingStore<MemoryStore>>,
    cache: Arc<MemoryProfileCache>,
    client: RaktoClient,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness() -> Harness {
    init_tracing();
    let store = Arc::new(FailingStore::new(MemoryStore::new()));
    let cache = Arc::new(MemoryProfileCache::new());
    let client = RaktoClient::new(
        store.clone(),
        Arc::new(MockAuth::new()),
        cache.clone(),
        &ClientConfig::default(),
    );
    Harness {
        store,
        cache,
        client,
    }
}

async fn signed_in(h: &Harness) {
    h.client
        .session()
        .set_identity(Some(AuthIdentity::with_phone("uid-1", "+8801712345678")))
        .await
        .unwrap();
}

fn donor_form() -> DonorRegistrationForm {
    DonorRegistrationForm {
        name: "Rahim Uddin".to_string(),
        blood_group: "O-".to_string(),
        date_of_birth: "1990-01-15".to_string(),
        gender: "male".to_string(),
        address: "12 Lake Road".to_string(),
        city: "Dhaka".to_string(),
        state: "Dhaka Division".to_string(),
        pincode: "12000".to_string(),
        emergency_contact_name: "Karim".to_string(),
        emergency_contact_phone: "+8801711111111".to_string(),
        location: None,
    }
}

fn request_form() -> BloodRequestForm {
    BloodRequestForm {
        patient_name: "Ayesha".to_string(),
        blood_group: "B+".to_string(),
        units: "2".to_string(),
        hospital_name: "Square Hospital".to_string(),
        hospital_address: "West Panthapath".to_string(),
        city: "Dhaka".to_string(),
        state: "Dhaka Division".to_string(),
        urgency: "high".to_string(),
        contact_number: "+8801812345678".to_string(),
        additional_info: String::new(),
    }
}

#[tokio::test]
async fn test_availability_toggle_is_idempotent() {
    let h = harness();
    signed_in(&h).await;
    let donor = h.client.register_donor(&donor_form()).await.unwrap();

    let first = h.client.set_availability(false).await.unwrap();
    let second = h.client.set_availability(false).await.unwrap();

    assert!(!first.is_available);
    assert!(!second.is_available);
    assert!(second.updated_at > first.updated_at);

    // Everything except availability and the write time is untouched
    let expected = DonorProfile {
        is_available: false,
        updated_at: second.updated_at,
        ..donor
    };
    assert_eq!(second, expected);
    assert_eq!(h.client.session().state().donor, Some(second));
}

#[tokio::test]
async fn test_failed_toggle_restores_previous_value() {
    let h = harness();
    signed_in(&h).await;
    h.client.register_donor(&donor_form()).await.unwrap();
    let before = h.client.session().state().donor.unwrap();

    h.store.set_fail_writes(true);
    let err = h.client.set_availability(false).await.unwrap_err();
    assert_eq!(err.user_message(), "backend unavailable: network request failed");

    let after = h.client.session().state().donor.unwrap();
    assert_eq!(after.is_available, before.is_available);

    let stored = h
        .store
        .inner()
        .get(Collection::Donors, &before.id)
        .await
        .unwrap()
        .unwrap();
    assert!(DonorProfile::from_document(stored).unwrap().is_available);
}

#[tokio::test]
async fn test_donor_registration_rejects_each_missing_field_without_sending() {
    let h = harness();
    signed_in(&h).await;

    let blank: [(&str, fn(&mut DonorRegistrationForm)); 10] = [
        ("name", |f| f.name.clear()),
        ("bloodGroup", |f| f.blood_group.clear()),
        ("dateOfBirth", |f| f.date_of_birth.clear()),
        ("gender", |f| f.gender.clear()),
        ("address", |f| f.address.clear()),
        ("city", |f| f.city.clear()),
        ("state", |f| f.state.clear()),
        ("pincode", |f| f.pincode.clear()),
        ("emergencyContactName", |f| f.emergency_contact_name.clear()),
        ("emergencyContactPhone", |f| f.emergency_contact_phone.clear()),
    ];

    for (field, clear) in blank {
        let mut form = donor_form();
        clear(&mut form);

        let err = h.client.register_donor(&form).await.unwrap_err();
        let ClientError::Validation(errors) = err else {
            panic!("{}: expected validation error, got {:?}", field, err);
        };
        assert_eq!(errors.fields(), vec![field]);
    }

    assert_eq!(h.store.inner().read_count(), 0);
    assert_eq!(h.store.inner().write_count(), 0);
    assert!(!h.client.session().state().is_registered);
}

#[tokio::test]
async fn test_blood_request_rejects_each_missing_field_without_sending() {
    let h = harness();
    signed_in(&h).await;

    let blank: [(&str, fn(&mut BloodRequestForm)); 9] = [
        ("patientName", |f| f.patient_name.clear()),
        ("bloodGroup", |f| f.blood_group.clear()),
        ("units", |f| f.units.clear()),
        ("hospitalName", |f| f.hospital_name.clear()),
        ("hospitalAddress", |f| f.hospital_address.clear()),
        ("city", |f| f.city.clear()),
        ("state", |f| f.state.clear()),
        ("urgency", |f| f.urgency.clear()),
        ("contactNumber", |f| f.contact_number.clear()),
    ];

    for (field, clear) in blank {
        let mut form = request_form();
        clear(&mut form);

        let err = h.client.create_request(&form).await.unwrap_err();
        let ClientError::Validation(errors) = err else {
            panic!("{}: expected validation error, got {:?}", field, err);
        };
        assert_eq!(errors.fields(), vec![field]);
    }

    assert_eq!(h.store.inner().write_count(), 0);
}

#[tokio::test]
async fn test_units_zero_or_non_numeric_are_rejected() {
    let h = harness();
    signed_in(&h).await;

    for units in ["0", "two"] {
        let form = BloodRequestForm {
            units: units.to_string(),
            ..request_form()
        };
        let err = h.client.create_request(&form).await.unwrap_err();
        assert!(err.user_message().starts_with("Invalid units"), "{}", err);
    }
    assert_eq!(h.store.inner().write_count(), 0);
}

#[tokio::test]
async fn test_request_round_trip_through_key() {
    let h = harness();
    signed_in(&h).await;

    let created = h.client.create_request(&request_form()).await.unwrap();
    let stored = h
        .store
        .get(Collection::BloodRequests, &created.id)
        .await
        .unwrap()
        .unwrap();
    let read_back = BloodRequest::from_document(stored).unwrap();

    assert_eq!(read_back, created);
    assert_eq!(read_back.status, RequestStatus::Pending);
    assert!(read_back.created_at.is_some());
    assert!(read_back.updated_at >= read_back.created_at);
    assert_eq!(h.client.my_requests().await.unwrap(), vec![created.clone()]);
    assert_eq!(h.client.recent_requests().await.unwrap(), vec![created]);
}

#[tokio::test]
async fn test_actions_require_sign_in() {
    let h = harness();
    assert!(matches!(
        h.client.register_donor(&donor_form()).await,
        Err(ClientError::NotAuthenticated)
    ));
    assert!(matches!(
        h.client.create_request(&request_form()).await,
        Err(ClientError::NotAuthenticated)
    ));
    assert!(matches!(
        h.client.set_availability(true).await,
        Err(ClientError::NotRegistered)
    ));
}

#[tokio::test]
async fn test_sign_in_register_and_sign_out() {
    let h = harness();

    let handle = h.client.auth().send_code("+880 1712 345678").await.unwrap();
    let profile = h.client.auth().verify_code(&handle, DEFAULT_CODE).await.unwrap();
    assert_eq!(h.cache.snapshot().await, Some(profile.clone()));

    let donor = h.client.register_donor(&donor_form()).await.unwrap();
    assert_eq!(donor.user_id, profile.uid);
    assert_eq!(donor.phone_number, "+8801712345678");
    assert!(h.client.session().state().is_registered);

    h.client.auth().sign_out().await.unwrap();
    let state = h.client.session().state();
    assert!(!state.is_authenticated);
    assert!(state.profile.is_none());
    assert!(state.donor.is_none());
    assert_eq!(h.cache.snapshot().await, None);
}

#[tokio::test]
async fn test_listener_restores_donor_on_sign_in() {
    let h = harness();
    let auth = Arc::new(MockAuth::new());
    let client = RaktoClient::new(
        h.store.clone(),
        auth.clone(),
        h.cache.clone(),
        &ClientConfig::default(),
    );
    let existing = client
        .donors()
        .register("uid-42", "+15551234567", &donor_form())
        .await
        .unwrap();

    let mut listener = client.auth().listen();
    let mut watcher = client.session().subscribe();
    auth.sign_in_as(AuthIdentity::with_phone("uid-42", "+15551234567"));

    let state = watcher.wait_for(|s| s.is_registered).await.unwrap().clone();
    assert_eq!(state.donor, Some(existing));
    assert!(state.profile.is_some());

    listener.cancel();
    auth.sign_out().await.unwrap();
    tokio::task::yield_now().await;
    assert!(client.session().state().is_authenticated);
}

#[tokio::test]
async fn test_cached_profile_survives_restart_with_sqlite() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let auth = Arc::new(MockAuth::new());

    let profile = {
        let client = RaktoClient::new(
            Arc::new(db.clone()),
            auth.clone(),
            Arc::new(LocalProfileCache::new(db.clone())),
            &ClientConfig::default(),
        );
        let handle = client.auth().send_code("+8801712345678").await.unwrap();
        client.auth().verify_code(&handle, DEFAULT_CODE).await.unwrap()
    };

    let client = RaktoClient::new(
        Arc::new(db.clone()),
        auth,
        Arc::new(LocalProfileCache::new(db)),
        &ClientConfig::default(),
    );
    let state = client.session().hydrate_from_cache().await.unwrap();
    assert_eq!(state.profile, Some(profile));
    assert!(!state.is_authenticated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_on_sqlite_never_roll_back() {
    init_tracing();
    let name = format!("rakto-flows-{}.db", uuid::Uuid::new_v4().simple());
    let path = std::env::temp_dir().join(name);
    let db = Database::connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .unwrap();
    db.migrate().await.unwrap();

    let mut clients = Vec::new();
    for n in 0..10 {
        let client = RaktoClient::new(
            Arc::new(db.clone()),
            Arc::new(MockAuth::new()),
            Arc::new(MemoryProfileCache::new()),
            &ClientConfig::default(),
        );
        let phone = format!("+88017100000{:02}", n);
        client
            .session()
            .set_identity(Some(AuthIdentity::with_phone(format!("uid-{}", n), phone)))
            .await
            .unwrap();
        client.register_donor(&donor_form()).await.unwrap();
        clients.push(Arc::new(client));
    }

    let tasks: Vec<_> = clients
        .iter()
        .cloned()
        .map(|client| {
            tokio::spawn(async move {
                let mut failures = 0;
                for round in 0..5 {
                    if client.set_availability(round % 2 == 1).await.is_err() {
                        failures += 1;
                    }
                }
                failures
            })
        })
        .collect();

    let mut failures = 0;
    for task in tasks {
        failures += task.await.unwrap();
    }

    // Five rounds starting from "available" end on "unavailable".
    for client in &clients {
        let donor = client.session().state().donor.unwrap();
        assert!(!donor.is_available);
        let stored = db.get(Collection::Donors, &donor.id).await.unwrap().unwrap();
        assert!(!DonorProfile::from_document(stored).unwrap().is_available);
    }

    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
    assert_eq!(failures, 0);
}
