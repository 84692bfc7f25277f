//! Single binary web server: JSON API over the fixture engine, state kept in memory.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, INACTIVITY_HOURS (idle competitions are dropped after this long).

use actix_web::{
    get, post,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use fixture_engine::{
    advance_bracket, generate_or_existing, knockout_or_existing, parse_roster_csv, record_result,
    roster_with_groups, swiss_round_or_open, CompetitionConfig, CompetitionId, EngineError,
    FixtureSet, Format, Match, PointValues, ResultEvent, StandingsTable, Team, TieBreak,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Per-competition entry: configuration, roster, persisted matches and standings.
struct CompetitionEntry {
    config: CompetitionConfig,
    roster: Vec<Team>,
    matches: Vec<Match>,
    standings: StandingsTable,
    created_at: DateTime<Utc>,
    fixtures_generated_at: Option<DateTime<Utc>>,
    last_activity: Instant,
}

/// In-memory store: competitions by id. The write lock makes each category single-writer.
type AppState = Data<RwLock<HashMap<CompetitionId, CompetitionEntry>>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct CompetitionView<'a> {
    id: CompetitionId,
    config: &'a CompetitionConfig,
    roster: &'a [Team],
    match_count: usize,
    created_at: DateTime<Utc>,
    fixtures_generated_at: Option<DateTime<Utc>>,
}

impl CompetitionEntry {
    fn view(&self) -> CompetitionView<'_> {
        CompetitionView {
            id: self.config.competition_id,
            config: &self.config,
            roster: &self.roster,
            match_count: self.matches.len(),
            created_at: self.created_at,
            fixtures_generated_at: self.fixtures_generated_at,
        }
    }

    /// Add teams to categories that have no fixtures yet.
    fn add_teams(&mut self, teams: Vec<Team>) -> Result<(), EngineError> {
        for team in &teams {
            if self.matches.iter().any(|m| m.category == team.category) {
                return Err(EngineError::Roster(format!(
                    "category {} already has fixtures",
                    team.category
                )));
            }
            if self
                .roster
                .iter()
                .any(|t| t.category == team.category && t.id == team.id)
            {
                return Err(EngineError::Roster(format!(
                    "team {} already registered in category {}",
                    team.id, team.category
                )));
            }
        }
        self.roster.extend(teams);
        Ok(())
    }

    /// Persist new matches; byes arrive finalized and count immediately.
    fn store_matches(&mut self, new: Vec<Match>) -> Result<(), EngineError> {
        let mut standings = self.standings.clone();
        for m in new.iter().filter(|m| m.is_finalized()) {
            standings.apply_result(m, &self.config)?;
        }
        self.standings = standings;
        self.matches.extend(new);
        self.roster = roster_with_groups(&self.roster, &self.matches);
        Ok(())
    }

    /// Store a freshly generated set; an existing one is only handed back.
    fn store_set(&mut self, set: FixtureSet) -> HttpResponse {
        if set.is_generated() {
            if let Err(e) = self.store_matches(set.matches().to_vec()) {
                return error_response(&e);
            }
        }
        HttpResponse::Ok().json(set)
    }
}

#[derive(Deserialize)]
struct CreateCompetitionBody {
    format: Format,
    #[serde(default)]
    points: Option<PointValues>,
    #[serde(default)]
    tie_break_order: Option<Vec<TieBreak>>,
    #[serde(default)]
    draw_seed: Option<u64>,
    #[serde(default)]
    roster: Vec<Team>,
}

#[derive(Serialize)]
struct ResultResponse {
    #[serde(rename = "match")]
    game: Match,
    standings: Vec<fixture_engine::StandingsRow>,
    /// Knockout matches that became playable with this result.
    ready: Vec<Match>,
}

/// Path segment: competition id (e.g. /api/competitions/{id})
#[derive(Deserialize)]
struct CompetitionPath {
    id: CompetitionId,
}

/// Path segments: competition id and category.
#[derive(Deserialize)]
struct CategoryPath {
    id: CompetitionId,
    category: String,
}

fn error_response(e: &EngineError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        EngineError::MatchNotFound(_) => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No competition" }))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "fixture-engine-web",
    })
}

/// Create a competition from a format and optional roster.
#[post("/api/competitions")]
async fn api_create_competition(state: AppState, body: Json<CreateCompetitionBody>) -> HttpResponse {
    let body = body.into_inner();
    let mut config = CompetitionConfig::new(Uuid::new_v4(), body.format);
    if let Some(points) = body.points {
        config.points = points;
    }
    if let Some(order) = body.tie_break_order {
        config.tie_break_order = order;
    }
    config.draw_seed = body.draw_seed;
    if let Err(e) = config.validate() {
        return error_response(&e);
    }

    let mut entry = CompetitionEntry {
        config,
        roster: Vec::new(),
        matches: Vec::new(),
        standings: StandingsTable::new(),
        created_at: Utc::now(),
        fixtures_generated_at: None,
        last_activity: Instant::now(),
    };
    if let Err(e) = entry.add_teams(body.roster) {
        return error_response(&e);
    }

    let id = entry.config.competition_id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    log::info!("created competition {}", id);
    let response = HttpResponse::Ok().json(entry.view());
    g.insert(id, entry);
    response
}

/// Get a competition by id. Touching it refreshes last_activity.
#[get("/api/competitions/{id}")]
async fn api_get_competition(state: AppState, path: Path<CompetitionPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(entry.view())
        }
        None => not_found(),
    }
}

/// Register one team.
#[post("/api/competitions/{id}/teams")]
async fn api_add_team(state: AppState, path: Path<CompetitionPath>, body: Json<Team>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match entry.add_teams(vec![body.into_inner()]) {
        Ok(()) => HttpResponse::Ok().json(entry.view()),
        Err(e) => error_response(&e),
    }
}

/// Import teams from a CSV body (`id,name,category,seed`).
#[post("/api/competitions/{id}/roster")]
async fn api_import_roster(state: AppState, path: Path<CompetitionPath>, body: String) -> HttpResponse {
    let teams = match parse_roster_csv(body.as_bytes()) {
        Ok(teams) => teams,
        Err(e) => return error_response(&e),
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match entry.add_teams(teams) {
        Ok(()) => HttpResponse::Ok().json(entry.view()),
        Err(e) => error_response(&e),
    }
}

/// Generate fixtures. Categories that already have matches return them unchanged.
#[post("/api/competitions/{id}/fixtures")]
async fn api_generate_fixtures(state: AppState, path: Path<CompetitionPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    let sets = match generate_or_existing(&entry.matches, &entry.roster, &entry.config) {
        Ok(sets) => sets,
        Err(e) => return error_response(&e),
    };
    let new: Vec<Match> = sets
        .iter()
        .filter(|s| s.is_generated())
        .flat_map(|s| s.matches().iter().cloned())
        .collect();
    if !new.is_empty() {
        if let Err(e) = entry.store_matches(new) {
            return error_response(&e);
        }
        entry.fixtures_generated_at = Some(Utc::now());
    }
    HttpResponse::Ok().json(sets)
}

/// All matches of a competition.
#[get("/api/competitions/{id}/matches")]
async fn api_list_matches(state: AppState, path: Path<CompetitionPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.matches)
        }
        None => not_found(),
    }
}

/// Enter a score: finalizes the match, updates standings, advances the bracket.
/// Nothing is stored unless all three succeed.
#[post("/api/competitions/{id}/results")]
async fn api_submit_result(
    state: AppState,
    path: Path<CompetitionPath>,
    body: Json<ResultEvent>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();

    let mut matches = entry.matches.clone();
    let mut standings = entry.standings.clone();
    let outcome = record_result(&mut matches, &body).and_then(|game| {
        let rows = standings.apply_result(&game, &entry.config)?;
        let ready = advance_bracket(&mut matches, game.id)?;
        Ok(ResultResponse {
            game,
            standings: rows,
            ready,
        })
    });
    match outcome {
        Ok(response) => {
            entry.matches = matches;
            entry.standings = standings;
            HttpResponse::Ok().json(response)
        }
        Err(e) => error_response(&e),
    }
}

/// Build the knockout phase of a category once its groups are finished.
/// A bracket that already exists is returned unchanged.
#[post("/api/competitions/{id}/categories/{category}/knockout")]
async fn api_build_knockout(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match knockout_or_existing(&entry.matches, &entry.config, &path.category) {
        Ok(set) => entry.store_set(set),
        Err(e) => error_response(&e),
    }
}

/// Pair the next Swiss round of a category, or return the current one while it is open.
#[post("/api/competitions/{id}/categories/{category}/swiss/next")]
async fn api_next_swiss_round(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match swiss_round_or_open(&entry.roster, &entry.matches, &entry.config, &path.category) {
        Ok(set) => entry.store_set(set),
        Err(e) => error_response(&e),
    }
}

/// Ranked table of a category.
#[get("/api/competitions/{id}/categories/{category}/standings")]
async fn api_standings(state: AppState, path: Path<CategoryPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(entry.standings.ranked(&path.category, &entry.config))
        }
        None => not_found(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_inactivity_hours() -> u64 {
    12
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let inactivity_hours: u64 = std::env::var("INACTIVITY_HOURS")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or_else(default_inactivity_hours);
    let inactivity_timeout = Duration::from_secs(inactivity_hours * 3600);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<CompetitionId, CompetitionEntry>::new()));

    // Background task: every 30 minutes, drop competitions idle for longer than the timeout
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < inactivity_timeout);
            let removed = before - g.len();
            if removed > 0 {
                log::info!(
                    "Cleaned up {} inactive competition(s) (no activity for {}h)",
                    removed,
                    inactivity_hours
                );
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_competition)
            .service(api_get_competition)
            .service(api_add_team)
            .service(api_import_roster)
            .service(api_generate_fixtures)
            .service(api_list_matches)
            .service(api_submit_result)
            .service(api_build_knockout)
            .service(api_next_swiss_round)
            .service(api_standings)
    })
    .bind(bind)?
    .run()
    .await
}
