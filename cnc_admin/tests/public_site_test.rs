/// Integration tests for the public-site client.
///
/// The tests verify:
/// 1. Newsletter signup goes out without credentials
/// 2. Reports, shares and preference resets carry `Bearer <token>`
/// 3. Payloads reach the server intact
/// 4. Server rejections surface as HTTP errors with the server's message
/// 5. The FAQ video is fetched anonymously and turned into an embed link

use cnc_admin::{AdminConfig, AdminError, Multiplier, PublicClient};
use cnc_common::{FaqVideo, IssueReport, NewsletterSignup, ShareSettingsRequest};
use cnc_sim::{spawn, Sim, SimState};

/// Simulator expecting the token `tok`.
async fn start() -> (Sim, String) {
    let mut state = SimState::new();
    state.require_token(Some("tok"));
    let (url, sim) = spawn(state).await.expect("simulator should start");
    (sim, url)
}

fn client(url: &str, token: Option<&str>) -> PublicClient {
    let mut config = AdminConfig::new(url).with_public_base_url(url);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    PublicClient::new(&config).expect("public url is configured")
}

#[tokio::test]
async fn newsletter_needs_no_token() {
    let (sim, url) = start().await;
    let public = client(&url, None);

    let signup = NewsletterSignup {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    };
    public.subscribe(&signup).await.unwrap();

    let submissions = sim.with(|s| s.submissions.clone()).await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].endpoint, "/newsletter");
    assert_eq!(submissions[0].body["email"], "ada@example.com");
}

#[tokio::test]
async fn authenticated_calls_send_bearer_token() {
    let (sim, url) = start().await;
    let public = client(&url, Some("tok"));

    public
        .report_issue(&IssueReport {
            email: "ada@example.com".to_string(),
            subject: "Feed too high".to_string(),
            message: "Oak at 18k burns".to_string(),
        })
        .await
        .unwrap();

    let mut multiplier = Multiplier::default();
    multiplier.increment();
    public
        .share_settings(&ShareSettingsRequest {
            machine: "Shapeoko 4".to_string(),
            spindle: "Router A".to_string(),
            bit: "1/4 Downcut".to_string(),
            material: "Oak".to_string(),
            multiplier: multiplier.value(),
        })
        .await
        .unwrap();
    public.reset_preference().await.unwrap();

    let requests = sim.requests().await;
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|r| r.authorization.as_deref() == Some("Bearer tok")));
    assert_eq!(requests[2].method, "DELETE");

    let submissions = sim.with(|s| s.submissions.clone()).await;
    let endpoints: Vec<_> = submissions.iter().map(|s| s.endpoint.as_str()).collect();
    assert_eq!(endpoints, vec!["/report", "/cnc/share-settings", "/cnc/reset-preference"]);
    assert_eq!(submissions[1].body["multiplier"], 1.1);
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let (sim, url) = start().await;
    let public = client(&url, Some("stale"));

    let err = public.reset_preference().await.unwrap_err();
    assert!(matches!(err, AdminError::Http { status: 401, .. }));
    assert_eq!(err.server_message_or("Failed to reset preference"), "Unauthorized");
    assert!(sim.with(|s| s.submissions.is_empty()).await);
}

#[tokio::test]
async fn faq_video_is_fetched_without_a_token() {
    let (sim, url) = start().await;
    sim.with(|s| {
        s.faq_video = Some(FaqVideo {
            kind: "faq".to_string(),
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            updated_at: "2025-03-01T10:00:00Z".to_string(),
        })
    })
    .await;
    let public = client(&url, None);

    let video = public.faq_video().await.unwrap();
    assert_eq!(video.embed_url(), "https://www.youtube.com/embed/dQw4w9WgXcQ");
    let requests = sim.requests().await;
    assert_eq!(requests[0].path, "/videos/faq");
    assert_eq!(requests[0].authorization, None);
}

#[tokio::test]
async fn missing_faq_video_is_an_http_error() {
    let (_sim, url) = start().await;
    let err = client(&url, None).faq_video().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
