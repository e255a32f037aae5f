use aocrecs_types::{Lookup, Table};

use crate::queries::{select_all, SqlQuery, REFERENCE_TABLES};
use crate::retry::fetch_with_reconnect;
use crate::session::Session;
use crate::DatabaseError;

/// The lookup tables held in memory, each indexed by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTables {
    pub maps: Table,
    pub civilization_bonuses: Table,
    pub player_colors: Table,
    pub civilizations: Table,
    pub map_sizes: Table,
    pub event_maps: Table,
    pub datasets: Table,
    pub game_types: Table,
    pub technologies: Table,
    pub difficulties: Table,
    pub map_reveal_choices: Table,
    pub speeds: Table,
    pub starting_resources: Table,
    pub starting_ages: Table,
    pub victory_conditions: Table,
    pub terrain: Table,
    pub versions: Table,
    pub actions: Table,
    pub resources: Table,
    pub formation_types: Table,
    pub objects: Table,
    pub tournaments: Table,
}

/// Fetch a whole reference table and index it by `id`.
pub async fn load_reference_table<S>(session: &mut S, name: &str) -> Result<Table, DatabaseError>
where
    S: Session + ?Sized,
{
    let query = SqlQuery::new(select_all(name)?);
    let mut table = fetch_with_reconnect(session, &query).await?;
    if !table.is_empty() {
        table.set_index("id")?;
    }
    tracing::info!("Loaded reference table {} ({} rows)", name, table.len());
    Ok(table)
}

impl ReferenceTables {
    /// Load every reference table in turn. The first failure aborts.
    pub async fn load<S>(session: &mut S) -> Result<Self, DatabaseError>
    where
        S: Session + ?Sized,
    {
        Ok(Self {
            maps: load_reference_table(session, "maps").await?,
            civilization_bonuses: load_reference_table(session, "civilization_bonuses").await?,
            player_colors: load_reference_table(session, "player_colors").await?,
            civilizations: load_reference_table(session, "civilizations").await?,
            map_sizes: load_reference_table(session, "map_sizes").await?,
            event_maps: load_reference_table(session, "event_maps").await?,
            datasets: load_reference_table(session, "datasets").await?,
            game_types: load_reference_table(session, "game_types").await?,
            technologies: load_reference_table(session, "technologies").await?,
            difficulties: load_reference_table(session, "difficulties").await?,
            map_reveal_choices: load_reference_table(session, "map_reveal_choices").await?,
            speeds: load_reference_table(session, "speeds").await?,
            starting_resources: load_reference_table(session, "starting_resources").await?,
            starting_ages: load_reference_table(session, "starting_ages").await?,
            victory_conditions: load_reference_table(session, "victory_conditions").await?,
            terrain: load_reference_table(session, "terrain").await?,
            versions: load_reference_table(session, "versions").await?,
            actions: load_reference_table(session, "actions").await?,
            resources: load_reference_table(session, "resources").await?,
            formation_types: load_reference_table(session, "formation_types").await?,
            objects: load_reference_table(session, "objects").await?,
            tournaments: load_reference_table(session, "tournaments").await?,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        let table = match name {
            "maps" => &self.maps,
            "civilization_bonuses" => &self.civilization_bonuses,
            "player_colors" => &self.player_colors,
            "civilizations" => &self.civilizations,
            "map_sizes" => &self.map_sizes,
            "event_maps" => &self.event_maps,
            "datasets" => &self.datasets,
            "game_types" => &self.game_types,
            "technologies" => &self.technologies,
            "difficulties" => &self.difficulties,
            "map_reveal_choices" => &self.map_reveal_choices,
            "speeds" => &self.speeds,
            "starting_resources" => &self.starting_resources,
            "starting_ages" => &self.starting_ages,
            "victory_conditions" => &self.victory_conditions,
            "terrain" => &self.terrain,
            "versions" => &self.versions,
            "actions" => &self.actions,
            "resources" => &self.resources,
            "formation_types" => &self.formation_types,
            "objects" => &self.objects,
            "tournaments" => &self.tournaments,
            _ => return None,
        };
        Some(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Table)> {
        REFERENCE_TABLES
            .into_iter()
            .filter_map(move |name| self.get(name).map(|table| (name, table)))
    }

    /// Version name to version id.
    pub fn version_lookup(&self) -> Result<Lookup, DatabaseError> {
        version_lookup(&self.versions)
    }
}

pub(crate) fn version_lookup(versions: &Table) -> Result<Lookup, DatabaseError> {
    if versions.is_empty() {
        return Ok(Lookup::default());
    }
    Ok(Lookup::from_table(versions, "name", "id")?)
}
