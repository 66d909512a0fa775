//! End-to-end authentication flows against a mocked portal.

use pesu_auth::*;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ─────────────────────── fixtures ───────────────────────

const SESSION_COOKIE: &str = "JSESSIONID=abc123";

fn landing_page() -> String {
    r#"<html><head><meta name="csrf-token" content="landing-token"></head>
       <body><div class="login-form"><form></form></div></body></html>"#
        .to_string()
}

fn home_page() -> String {
    r#"<html><head><meta name="csrf-token" content="fresh-token"></head>
       <body><span class="menu-name">My Profile</span></body></html>"#
        .to_string()
}

fn rejected_page() -> String {
    r#"<html><head><meta name="csrf-token" content="retry-token"></head>
       <body><div class="login-form">
         <span class="login-msg">Your Username and Password do not match</span>
       </div></body></html>"#
        .to_string()
}

fn block(label: &str, value: &str) -> String {
    format!(r#"<div class="form-group"><label>{label}</label> <label>{value}</label></div>"#)
}

fn profile_page() -> String {
    let blocks = [
        block("Name", "Johnny Blaze"),
        block("PESU Id", "PES1201800001"),
        block("SRN", "PES1UG20CS001"),
        block("Program", "Bachelor of Technology"),
        block("Branch", "Computer Science and Engineering"),
        block("Semester", "Sem-6"),
        block("Section", "Section A"),
    ]
    .concat();
    format!(
        r#"<html><body>{blocks}
           <input id="updateMail" value="johnnyblaze@gmail.com">
           <input id="updateContact" value=" 1234567890 ">
           </body></html>"#
    )
}

fn class_info_page() -> String {
    r#"<table>
         <tr><th>Class</th><th>Cycle</th><th>Department</th><th>Institute Name</th></tr>
         <tr><td>6th Sem</td><td>NA</td><td>CSE</td><td>PES University (Ring Road Campus)</td></tr>
       </table>"#
        .to_string()
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html;charset=UTF-8")
        .set_body_string(body)
}

fn client_for(server: &MockServer) -> PortalClient {
    PortalClient::new(PortalConfig::with_base_url(&server.uri()).unwrap())
}

fn no_cookie(req: &Request) -> bool {
    !req.headers.contains_key("cookie")
}

/// Landing page that hands out the session cookie, and a login endpoint
/// that accepts `PES1UG20CS001` / `s3cret` only with that cookie.
async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Academy/"))
        .and(no_cookie)
        .respond_with(html(landing_page()).insert_header("set-cookie", "JSESSIONID=abc123; Path=/"))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Academy/j_spring_security_check"))
        .and(header("cookie", SESSION_COOKIE))
        .and(body_string_contains("_csrf=landing-token"))
        .and(body_string_contains("j_username=PES1UG20CS001"))
        .and(body_string_contains("j_password=s3cret"))
        .respond_with(html(home_page()))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Academy/j_spring_security_check"))
        .respond_with(html(rejected_page()))
        .with_priority(5)
        .mount(server)
        .await;
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Academy/s/studentProfilePESUAdmin"))
        .and(header("cookie", SESSION_COOKIE))
        .and(query_param("menuId", "670"))
        .and(query_param("controllerMode", "6414"))
        .and(query_param("actionType", "5"))
        .respond_with(html(profile_page()))
        .mount(server)
        .await;
}

fn valid() -> Credentials {
    Credentials::new("PES1UG20CS001", "s3cret")
}

// ─────────────────────── login ───────────────────────

#[tokio::test]
async fn test_success_without_profile() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let result = client_for(&server).authenticate(&valid(), false, None).await;

    assert!(result.status);
    assert_eq!(result.message, "Login successful.");
    assert!(result.profile.is_none());
    assert!(result.error.is_none());

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("profile").is_none());
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_invalid_credentials_have_no_profile() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/Academy/s/studentProfilePESUAdmin"))
        .respond_with(html(profile_page()))
        .expect(0)
        .mount(&server)
        .await;

    let creds = Credentials::new("INVALID_USER", "wrongpass");
    let result = client_for(&server).authenticate(&creds, true, None).await;

    assert!(!result.status);
    assert!(result.message.contains("Invalid username or password"));
    assert!(result.profile.is_none());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_repeated_calls_do_not_share_sessions() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    // Both landing requests must arrive without a cookie.
    Mock::given(method("GET"))
        .and(path("/Academy/"))
        .and(no_cookie)
        .respond_with(html(landing_page()).insert_header("set-cookie", "JSESSIONID=abc123; Path=/"))
        .with_priority(1)
        .expect(2)
        .named("cookieless landing page")
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.authenticate(&valid(), false, None).await;
    let second = client.authenticate(&valid(), false, None).await;

    assert!(first.status);
    assert!(second.status);
}

#[tokio::test]
async fn test_token_fetch_transport_failure() {
    // Reserve a port and release it so nothing is listening there.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client =
        PortalClient::new(PortalConfig::with_base_url(&format!("http://{addr}")).unwrap());

    let result = client.authenticate(&valid(), true, None).await;

    assert!(!result.status);
    assert_eq!(result.message, "Unable to fetch csrf token.");
    assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert!(result.profile.is_none());
}

#[tokio::test]
async fn test_missing_token_on_landing_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Academy/"))
        .respond_with(html("<html><body>Under maintenance</body></html>".to_string()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Academy/j_spring_security_check"))
        .respond_with(html(home_page()))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server).authenticate(&valid(), false, None).await;

    assert!(!result.status);
    assert_eq!(result.message, "Unable to fetch csrf token.");
    assert_eq!(
        result.error.as_deref(),
        Some("csrf token not found in page markup")
    );
}

#[tokio::test]
async fn test_timeout_is_reported_as_login_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Academy/"))
        .respond_with(html(landing_page()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Academy/j_spring_security_check"))
        .respond_with(html(home_page()).set_delay(std::time::Duration::from_millis(1500)))
        .mount(&server)
        .await;

    let mut config = PortalConfig::with_base_url(&server.uri()).unwrap();
    config.timeout_ms = 200;
    let result = PortalClient::new(config)
        .authenticate(&valid(), false, None)
        .await;

    assert!(!result.status);
    assert_eq!(result.message, "Unable to authenticate.");
    assert!(result.error.is_some());
}

// ─────────────────────── profile ───────────────────────

#[tokio::test]
async fn test_success_with_full_profile() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_profile(&server).await;

    let result = client_for(&server).authenticate(&valid(), true, None).await;
    assert!(result.status);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json["profile"],
        serde_json::json!({
            "name": "Johnny Blaze",
            "prn": "PES1201800001",
            "srn": "PES1UG20CS001",
            "program": "Bachelor of Technology",
            "branch_short_code": "CSE",
            "branch": "Computer Science and Engineering",
            "semester": "Sem-6",
            "section": "Section A",
            "email": "johnnyblaze@gmail.com",
            "phone": "1234567890",
            "campus_code": 1,
            "campus": "RR",
        })
    );
}

#[tokio::test]
async fn test_field_projection() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_profile(&server).await;

    let filter = FieldFilter::parse(["prn", "branch", "branch_short_code", "campus"]).unwrap();
    let result = client_for(&server)
        .authenticate(&valid(), true, Some(&filter))
        .await;

    let profile = result.profile.as_ref().and_then(|p| p.record()).unwrap();
    assert_eq!(
        profile.fields().collect::<Vec<_>>(),
        vec![
            ProfileField::Prn,
            ProfileField::BranchShortCode,
            ProfileField::Branch,
            ProfileField::Campus,
        ]
    );
    assert!(!profile.contains(ProfileField::Name));
}

#[tokio::test]
async fn test_profile_redirect_becomes_profile_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/Academy/s/studentProfilePESUAdmin"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/Academy/"))
        .mount(&server)
        .await;

    let result = client_for(&server).authenticate(&valid(), true, None).await;

    assert!(result.status);
    assert_eq!(result.message, "Login successful.");
    assert!(result.error.is_none());
    let error = result.profile.as_ref().and_then(|p| p.error()).unwrap();
    assert!(error.starts_with("Unable to fetch profile data"));
    assert!(error.contains("302"));
}

#[tokio::test]
async fn test_profile_without_markup_becomes_profile_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/Academy/s/studentProfilePESUAdmin"))
        .respond_with(html("<html><body></body></html>".to_string()))
        .mount(&server)
        .await;

    let result = client_for(&server).authenticate(&valid(), true, None).await;

    assert!(result.status);
    let json = serde_json::to_value(&result).unwrap();
    assert!(json["profile"]["error"]
        .as_str()
        .unwrap()
        .contains("no profile blocks"));
}

#[tokio::test]
async fn test_class_lookup_fills_legacy_fields() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_profile(&server).await;
    Mock::given(method("POST"))
        .and(path("/Academy/getStudentClassInfo"))
        .and(header("x-csrf-token", "fresh-token"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("loginId=PES1UG20CS001"))
        .respond_with(html(class_info_page()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = PortalConfig::with_base_url(&server.uri()).unwrap();
    config.class_lookup = true;
    let result = PortalClient::new(config)
        .authenticate(&valid(), true, None)
        .await;

    let profile = result.profile.as_ref().and_then(|p| p.record()).unwrap();
    assert_eq!(profile.text(ProfileField::Class), Some("6th Sem"));
    assert_eq!(profile.text(ProfileField::Cycle), Some("NA"));
    assert_eq!(profile.text(ProfileField::Department), Some("CSE"));
    assert_eq!(
        profile.text(ProfileField::InstituteName),
        Some("PES University (Ring Road Campus)")
    );
    assert_eq!(profile.text(ProfileField::Name), Some("Johnny Blaze"));
}

#[tokio::test]
async fn test_class_lookup_failure_is_ignored() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_profile(&server).await;
    Mock::given(method("POST"))
        .and(path("/Academy/getStudentClassInfo"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = PortalConfig::with_base_url(&server.uri()).unwrap();
    config.class_lookup = true;
    let result = PortalClient::new(config)
        .authenticate(&valid(), true, None)
        .await;

    assert!(result.status);
    let profile = result.profile.as_ref().and_then(|p| p.record()).unwrap();
    assert_eq!(profile.len(), 12);
    assert!(!profile.contains(ProfileField::Class));
}
