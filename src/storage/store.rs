//! In-memory league repository with optional JSONL write-through.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::calculate::{in_week, in_year, LookupError, TiebreakerLookup};
use crate::models::{
    Game, GameId, NewGame, Player, PlayerId, TiebreakScope, Tiebreaker, Title, TitleId,
};

/// Everything the store holds, copied out under one read lock.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeagueSnapshot {
    pub games: Vec<Game>,
    pub players: Vec<Player>,
    pub titles: Vec<Title>,
    pub tiebreakers: Vec<Tiebreaker>,
    #[serde(skip)]
    last_ids: LastIds,
}

/// Highest id ever issued per kind. Ids freed by a delete are not reissued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct LastIds {
    game: i64,
    player: i64,
    title: i64,
}

impl LeagueSnapshot {
    /// Active games in a local ISO week, oldest first.
    pub fn games_in_week(&self, year: i32, week: u32) -> Vec<Game> {
        active_sorted(self.games.iter().filter(|g| in_week(g, year, week)))
    }

    /// Active games in a local calendar year, oldest first.
    pub fn games_in_year(&self, year: i32) -> Vec<Game> {
        active_sorted(self.games.iter().filter(|g| in_year(g, year)))
    }

    pub fn active_players(&self) -> Vec<Player> {
        self.players.iter().filter(|p| p.is_active).cloned().collect()
    }

    /// Display names for every known player, active or not.
    pub fn player_names(&self) -> BTreeMap<PlayerId, String> {
        self.players
            .iter()
            .map(|p| (p.id, p.name.clone()))
            .collect()
    }

    pub fn tiebreaker(&self, scope: TiebreakScope, scope_key: &str) -> Option<&Tiebreaker> {
        self.tiebreakers
            .iter()
            .find(|tb| tb.scope == scope && tb.scope_key == scope_key)
    }
}

impl TiebreakerLookup for LeagueSnapshot {
    fn lookup(
        &self,
        scope: TiebreakScope,
        scope_key: &str,
    ) -> Result<Option<Tiebreaker>, LookupError> {
        Ok(self.tiebreaker(scope, scope_key).cloned())
    }
}

/// Games, players, titles and tiebreak decisions.
///
/// Reads are served from memory. When opened on a data directory every
/// mutation is written to disk before it becomes visible.
pub struct LeagueStore {
    data: RwLock<LeagueSnapshot>,
    storage: Option<StorageConfig>,
}

impl LeagueStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(LeagueSnapshot::default()),
            storage: None,
        }
    }

    /// Load a store from the JSONL files under `config.data_dir`.
    pub fn open(config: StorageConfig) -> Result<Self, StorageError> {
        let snapshot = LeagueSnapshot {
            games: JsonlReader::new(config.games_path()).read_all()?,
            players: JsonlReader::new(config.players_path()).read_all()?,
            titles: JsonlReader::new(config.titles_path()).read_all()?,
            tiebreakers: JsonlReader::new(config.tiebreakers_path()).read_all()?,
            last_ids: JsonlReader::new(config.last_ids_path())
                .read_all()?
                .pop()
                .unwrap_or_default(),
        };

        info!(
            "Loaded league from {:?}: {} games, {} players, {} titles, {} tiebreakers",
            config.data_dir,
            snapshot.games.len(),
            snapshot.players.len(),
            snapshot.titles.len(),
            snapshot.tiebreakers.len()
        );

        Ok(Self {
            data: RwLock::new(snapshot),
            storage: Some(config),
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.storage.as_ref().map(|c| c.data_dir.as_path())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LeagueSnapshot>, StorageError> {
        self.data.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LeagueSnapshot>, StorageError> {
        self.data.write().map_err(|_| StorageError::Poisoned)
    }

    fn append<T: Serialize>(
        &self,
        path: fn(&StorageConfig) -> PathBuf,
        item: &T,
    ) -> Result<(), StorageError> {
        if let Some(config) = &self.storage {
            JsonlWriter::new(path(config)).append(item)?;
        }
        Ok(())
    }

    fn rewrite<T: Serialize>(
        &self,
        path: fn(&StorageConfig) -> PathBuf,
        items: &[T],
    ) -> Result<(), StorageError> {
        if let Some(config) = &self.storage {
            JsonlWriter::new(path(config)).write_all(items)?;
        }
        Ok(())
    }

    fn save_last_ids(&self, last_ids: &LastIds) -> Result<(), StorageError> {
        self.rewrite(StorageConfig::last_ids_path, std::slice::from_ref(last_ids))
    }

    /// Fails only when the store can no longer be read.
    pub fn check_readable(&self) -> Result<(), StorageError> {
        self.read().map(|_| ())
    }

    /// Copy of the whole store taken under a single read lock.
    pub fn snapshot(&self) -> Result<LeagueSnapshot, StorageError> {
        Ok(self.read()?.clone())
    }

    // ---------------------------------------------------------------
    // Games
    // ---------------------------------------------------------------

    /// Validate and record a game. The title must exist and be active and
    /// every participant must be a known player.
    pub fn add_game(&self, new: NewGame, weekdays_only: bool) -> Result<Game, StorageError> {
        new.validate(weekdays_only)?;

        let mut data = self.write()?;

        let title = data
            .titles
            .iter()
            .find(|t| t.id == new.title_id)
            .ok_or(StorageError::NotFound {
                kind: "title",
                id: new.title_id.get(),
            })?;
        if !title.is_active {
            return Err(StorageError::Invalid(format!(
                "title {} is inactive",
                title.name
            )));
        }
        let title_name = title.name.clone();

        if let Some(missing) = new
            .participant_ids
            .iter()
            .find(|pid| !data.players.iter().any(|p| p.id == **pid))
        {
            return Err(StorageError::NotFound {
                kind: "player",
                id: missing.get(),
            });
        }

        let mut last_ids = data.last_ids;
        last_ids.game = next_id(last_ids.game, data.games.iter().map(|g| g.id.get()));
        let game = new.into_game(GameId::new(last_ids.game), title_name);

        self.save_last_ids(&last_ids)?;
        self.append(StorageConfig::games_path, &game)?;
        data.last_ids = last_ids;
        data.games.push(game.clone());

        info!(
            "Recorded game {} ({}) on {} with {} players",
            game.id,
            game.title,
            game.local_date(),
            game.participant_ids.len()
        );
        Ok(game)
    }

    pub fn get_game(&self, id: GameId) -> Result<Game, StorageError> {
        self.read()?
            .games
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or(StorageError::NotFound {
                kind: "game",
                id: id.get(),
            })
    }

    /// Soft delete (or restore) a game.
    pub fn set_game_active(&self, id: GameId, active: bool) -> Result<Game, StorageError> {
        let mut data = self.write()?;

        let mut games = data.games.clone();
        let game = games
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StorageError::NotFound {
                kind: "game",
                id: id.get(),
            })?;
        game.is_active = active;
        let updated = game.clone();

        self.rewrite(StorageConfig::games_path, &games)?;
        data.games = games;

        info!("Game {} active={}", id, active);
        Ok(updated)
    }

    /// Remove a game for good. Its id is retired, never handed out again.
    pub fn delete_game(&self, id: GameId) -> Result<Game, StorageError> {
        let mut data = self.write()?;

        let pos = data
            .games
            .iter()
            .position(|g| g.id == id)
            .ok_or(StorageError::NotFound {
                kind: "game",
                id: id.get(),
            })?;

        let mut games = data.games.clone();
        let removed = games.remove(pos);

        self.rewrite(StorageConfig::games_path, &games)?;
        data.games = games;

        info!("Deleted game {}", id);
        Ok(removed)
    }

    /// Newest games first (by play time, then id). A `limit` of 0 returns all.
    pub fn recent_games(
        &self,
        limit: usize,
        include_inactive: bool,
    ) -> Result<Vec<Game>, StorageError> {
        let data = self.read()?;

        let mut games: Vec<Game> = data
            .games
            .iter()
            .filter(|g| include_inactive || g.is_active)
            .cloned()
            .collect();
        games.sort_by(|a, b| b.played_at.cmp(&a.played_at).then(b.id.cmp(&a.id)));

        if limit > 0 {
            games.truncate(limit);
        }
        Ok(games)
    }

    pub fn games_in_week(&self, year: i32, week: u32) -> Result<Vec<Game>, StorageError> {
        Ok(self.read()?.games_in_week(year, week))
    }

    pub fn games_in_year(&self, year: i32) -> Result<Vec<Game>, StorageError> {
        Ok(self.read()?.games_in_year(year))
    }

    // ---------------------------------------------------------------
    // Players
    // ---------------------------------------------------------------

    /// Players ordered by name.
    pub fn list_players(&self, include_inactive: bool) -> Result<Vec<Player>, StorageError> {
        Ok(list_entries(&self.read()?.players, include_inactive))
    }

    pub fn get_player(&self, id: PlayerId) -> Result<Player, StorageError> {
        find_entry(&self.read()?.players, id.get()).cloned()
    }

    pub fn add_player(&self, name: &str) -> Result<Player, StorageError> {
        let mut data = self.write()?;

        let mut last_ids = data.last_ids;
        last_ids.player = next_id(last_ids.player, data.players.iter().map(|p| p.id.get()));
        let player = Player::new(PlayerId::new(last_ids.player), name)?;
        ensure_unique_name(&data.players, &player.name, None)?;

        self.save_last_ids(&last_ids)?;
        self.append(StorageConfig::players_path, &player)?;
        data.last_ids = last_ids;
        data.players.push(player.clone());

        info!("Added player {} ({})", player.name, player.id);
        Ok(player)
    }

    pub fn rename_player(&self, id: PlayerId, name: &str) -> Result<Player, StorageError> {
        let mut data = self.write()?;

        let players = with_entry(&data.players, id.get(), |p| {
            p.name = Player::new(id, name)?.name;
            Ok(())
        })?;
        ensure_unique_name(&data.players, &find_entry(&players, id.get())?.name, Some(id.get()))?;

        self.rewrite(StorageConfig::players_path, &players)?;
        data.players = players;
        find_entry(&data.players, id.get()).cloned()
    }

    pub fn set_player_active(&self, id: PlayerId, active: bool) -> Result<Player, StorageError> {
        let mut data = self.write()?;

        let players = with_entry(&data.players, id.get(), |p| {
            p.is_active = active;
            Ok(())
        })?;

        self.rewrite(StorageConfig::players_path, &players)?;
        data.players = players;

        info!("Player {} active={}", id, active);
        find_entry(&data.players, id.get()).cloned()
    }

    /// Refused while any game, active or not, names the player.
    pub fn delete_player(&self, id: PlayerId) -> Result<Player, StorageError> {
        let mut data = self.write()?;

        find_entry(&data.players, id.get())?;
        if data
            .games
            .iter()
            .any(|g| g.has_participant(id) || g.has_winner(id))
        {
            return Err(StorageError::Conflict(format!(
                "player {} is referenced by a game",
                id
            )));
        }

        let (players, removed) = without_entry(&data.players, id.get());
        self.rewrite(StorageConfig::players_path, &players)?;
        data.players = players;

        info!("Deleted player {}", id);
        removed
    }

    // ---------------------------------------------------------------
    // Titles
    // ---------------------------------------------------------------

    /// Titles ordered by name.
    pub fn list_titles(&self, include_inactive: bool) -> Result<Vec<Title>, StorageError> {
        Ok(list_entries(&self.read()?.titles, include_inactive))
    }

    pub fn get_title(&self, id: TitleId) -> Result<Title, StorageError> {
        find_entry(&self.read()?.titles, id.get()).cloned()
    }

    pub fn add_title(&self, name: &str) -> Result<Title, StorageError> {
        let mut data = self.write()?;

        let mut last_ids = data.last_ids;
        last_ids.title = next_id(last_ids.title, data.titles.iter().map(|t| t.id.get()));
        let title = Title::new(TitleId::new(last_ids.title), name)?;
        ensure_unique_name(&data.titles, &title.name, None)?;

        self.save_last_ids(&last_ids)?;
        self.append(StorageConfig::titles_path, &title)?;
        data.last_ids = last_ids;
        data.titles.push(title.clone());

        info!("Added title {} ({})", title.name, title.id);
        Ok(title)
    }

    /// Rename a title. Games keep the name they were recorded with.
    pub fn rename_title(&self, id: TitleId, name: &str) -> Result<Title, StorageError> {
        let mut data = self.write()?;

        let titles = with_entry(&data.titles, id.get(), |t| {
            t.name = Title::new(id, name)?.name;
            Ok(())
        })?;
        ensure_unique_name(&data.titles, &find_entry(&titles, id.get())?.name, Some(id.get()))?;

        self.rewrite(StorageConfig::titles_path, &titles)?;
        data.titles = titles;
        find_entry(&data.titles, id.get()).cloned()
    }

    pub fn set_title_active(&self, id: TitleId, active: bool) -> Result<Title, StorageError> {
        let mut data = self.write()?;

        let titles = with_entry(&data.titles, id.get(), |t| {
            t.is_active = active;
            Ok(())
        })?;

        self.rewrite(StorageConfig::titles_path, &titles)?;
        data.titles = titles;

        info!("Title {} active={}", id, active);
        find_entry(&data.titles, id.get()).cloned()
    }

    /// Refused while any game references the title.
    pub fn delete_title(&self, id: TitleId) -> Result<Title, StorageError> {
        let mut data = self.write()?;

        find_entry(&data.titles, id.get())?;
        if data.games.iter().any(|g| g.title_id == id) {
            return Err(StorageError::Conflict(format!(
                "title {} is referenced by a game",
                id
            )));
        }

        let (titles, removed) = without_entry(&data.titles, id.get());
        self.rewrite(StorageConfig::titles_path, &titles)?;
        data.titles = titles;

        info!("Deleted title {}", id);
        removed
    }

    // ---------------------------------------------------------------
    // Tiebreakers
    // ---------------------------------------------------------------

    /// `Ok(None)` when no decision is stored; `Err` only when the store
    /// itself cannot be read.
    pub fn get_tiebreaker(
        &self,
        scope: TiebreakScope,
        scope_key: &str,
    ) -> Result<Option<Tiebreaker>, StorageError> {
        Ok(self.read()?.tiebreaker(scope, scope_key).cloned())
    }

    /// Insert or replace the decision for `(scope, scope_key)`.
    /// Returns the decision it replaced, if any.
    pub fn set_tiebreaker(&self, tiebreaker: Tiebreaker) -> Result<Option<Tiebreaker>, StorageError> {
        let mut data = self.write()?;

        let mut tiebreakers = data.tiebreakers.clone();
        let previous = match tiebreakers
            .iter_mut()
            .find(|tb| tb.scope == tiebreaker.scope && tb.scope_key == tiebreaker.scope_key)
        {
            Some(existing) => Some(std::mem::replace(existing, tiebreaker.clone())),
            None => {
                tiebreakers.push(tiebreaker.clone());
                None
            }
        };

        self.rewrite(StorageConfig::tiebreakers_path, &tiebreakers)?;
        data.tiebreakers = tiebreakers;

        if let Some(prev) = &previous {
            debug!(
                "Replaced {} tiebreaker for {} (was {})",
                tiebreaker.scope, tiebreaker.scope_key, prev.winner_id
            );
        }
        info!(
            "Stored {} tiebreaker for {}: winner {}",
            tiebreaker.scope, tiebreaker.scope_key, tiebreaker.winner_id
        );
        Ok(previous)
    }

    pub fn list_tiebreakers(&self) -> Result<Vec<Tiebreaker>, StorageError> {
        Ok(self.read()?.tiebreakers.clone())
    }

    // ---------------------------------------------------------------
    // Seeding
    // ---------------------------------------------------------------

    /// Fill an empty roster and title list from configuration. Lists that
    /// already hold entries are left alone. Returns (players, titles) added.
    pub fn seed(&self, players: &[String], titles: &[String]) -> Result<(usize, usize), StorageError> {
        let (has_players, has_titles) = {
            let data = self.read()?;
            (!data.players.is_empty(), !data.titles.is_empty())
        };

        let mut added_players = 0;
        if !has_players {
            for name in players {
                match self.add_player(name) {
                    Ok(_) => added_players += 1,
                    Err(StorageError::Conflict(_) | StorageError::Invalid(_)) => {
                        warn!("Skipping seed player {:?}", name);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let mut added_titles = 0;
        if !has_titles {
            for name in titles {
                match self.add_title(name) {
                    Ok(_) => added_titles += 1,
                    Err(StorageError::Conflict(_) | StorageError::Invalid(_)) => {
                        warn!("Skipping seed title {:?}", name);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if added_players + added_titles > 0 {
            info!(
                "Seeded {} players and {} titles",
                added_players, added_titles
            );
        }
        Ok((added_players, added_titles))
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = self.data.write();
                    panic!("poisoning league store for test");
                })
                .join();
        });
    }
}

fn active_sorted<'a, I>(games: I) -> Vec<Game>
where
    I: Iterator<Item = &'a Game>,
{
    let mut out: Vec<Game> = games.filter(|g| g.is_active).cloned().collect();
    out.sort_by(|a, b| a.played_at.cmp(&b.played_at).then(a.id.cmp(&b.id)));
    out
}

/// One past the larger of `last` and every id still present.
fn next_id(last: i64, ids: impl Iterator<Item = i64>) -> i64 {
    ids.fold(last, i64::max) + 1
}

/// Shared shape of players and titles.
trait RosterEntry: Clone {
    const KIND: &'static str;
    fn raw_id(&self) -> i64;
    fn name(&self) -> &str;
    fn is_active(&self) -> bool;
}

impl RosterEntry for Player {
    const KIND: &'static str = "player";
    fn raw_id(&self) -> i64 {
        self.id.get()
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
}

impl RosterEntry for Title {
    const KIND: &'static str = "title";
    fn raw_id(&self) -> i64 {
        self.id.get()
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
}

fn list_entries<T: RosterEntry>(items: &[T], include_inactive: bool) -> Vec<T> {
    let mut out: Vec<T> = items
        .iter()
        .filter(|e| include_inactive || e.is_active())
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        a.name()
            .to_lowercase()
            .cmp(&b.name().to_lowercase())
            .then(a.raw_id().cmp(&b.raw_id()))
    });
    out
}

fn find_entry<T: RosterEntry>(items: &[T], id: i64) -> Result<&T, StorageError> {
    items
        .iter()
        .find(|e| e.raw_id() == id)
        .ok_or(StorageError::NotFound { kind: T::KIND, id })
}

/// Copy of `items` with one entry changed by `edit`.
fn with_entry<T, F>(items: &[T], id: i64, edit: F) -> Result<Vec<T>, StorageError>
where
    T: RosterEntry,
    F: FnOnce(&mut T) -> Result<(), StorageError>,
{
    let mut out = items.to_vec();
    let entry = out
        .iter_mut()
        .find(|e| e.raw_id() == id)
        .ok_or(StorageError::NotFound { kind: T::KIND, id })?;
    edit(entry)?;
    Ok(out)
}

fn without_entry<T: RosterEntry>(items: &[T], id: i64) -> (Vec<T>, Result<T, StorageError>) {
    let mut removed = Err(StorageError::NotFound { kind: T::KIND, id });
    let kept = items
        .iter()
        .filter(|e| {
            if e.raw_id() == id {
                removed = Ok((*e).clone());
                false
            } else {
                true
            }
        })
        .cloned()
        .collect();
    (kept, removed)
}

/// Names are unique per kind, ignoring case.
fn ensure_unique_name<T: RosterEntry>(
    items: &[T],
    name: &str,
    except: Option<i64>,
) -> Result<(), StorageError> {
    let wanted = name.to_lowercase();
    let taken = items
        .iter()
        .any(|e| Some(e.raw_id()) != except && e.name().to_lowercase() == wanted);
    if taken {
        return Err(StorageError::Conflict(format!(
            "{} named {:?} already exists",
            T::KIND,
            name
        )));
    }
    Ok(())
}
