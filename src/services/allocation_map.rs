// src/services/allocation_map.rs
//
// Agregação da semana de alocação: junta membros, alocações diárias e ausências
// em totais por (membro, projeto) e por membro. Tudo aqui é puro; o
// `ResourcingService` busca os dados e guarda o resultado em cache.

use chrono::{Datelike, Duration, NaiveDate};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use uuid::Uuid;

use crate::models::{
    allocation::{
        AllocationRow, DailyHours, HolidayRow, MemberAllocations, MemberSort, MemberWeekRow,
        ProjectAllocation, ProjectSummary, UtilizationLevel, WeekLeaveData,
    },
    settings::{DisplayPreference, ResourcingConfig},
    team::TeamMember,
};

/// Diferença mínima (em horas) para uma edição de célula ser gravada.
pub const HOURS_EPSILON: f64 = 0.01;

pub type AllocationKey = (Uuid, Uuid);

/// Segunda-feira da semana ISO que contém `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_end_of(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

/// Agrupa as linhas diárias em membro -> projeto -> dia.
pub fn nest_allocations(rows: &[AllocationRow]) -> Vec<MemberAllocations> {
    let mut grouped: BTreeMap<Uuid, BTreeMap<Uuid, Vec<DailyHours>>> = BTreeMap::new();

    for row in rows {
        grouped
            .entry(row.resource_id)
            .or_default()
            .entry(row.project_id)
            .or_default()
            .push(DailyHours { date: row.allocation_date, hours: row.hours });
    }

    grouped
        .into_iter()
        .map(|(member_id, projects)| MemberAllocations {
            member_id,
            projects: projects
                .into_iter()
                .map(|(project_id, mut days)| {
                    days.sort_by_key(|d| d.date);
                    ProjectAllocation {
                        project_id,
                        hours: days.iter().map(|d| d.hours).sum(),
                        daily_breakdown: days,
                    }
                })
                .collect(),
        })
        .collect()
}

fn project_allocation_hours(allocation: &ProjectAllocation) -> f64 {
    if allocation.daily_breakdown.is_empty() {
        allocation.hours
    } else {
        allocation.daily_breakdown.iter().map(|d| d.hours).sum()
    }
}

/// (membro, projeto) -> horas da semana. Entradas repetidas do mesmo par são somadas.
pub fn create_allocation_map(allocations: &[MemberAllocations]) -> HashMap<AllocationKey, f64> {
    let mut map = HashMap::new();
    for member in allocations {
        for project in &member.projects {
            *map.entry((member.member_id, project.project_id)).or_insert(0.0) +=
                project_allocation_hours(project);
        }
    }
    map
}

/// Projetos com horas de membros exibidos que não estão entre as colunas
/// (concluídos, cancelados ou de outro departamento). Ordenados por id.
pub fn projects_missing_from_columns(
    projects: &[ProjectSummary],
    members: &[TeamMember],
    allocation_map: &HashMap<AllocationKey, f64>,
) -> Vec<Uuid> {
    let columns: HashSet<Uuid> = projects.iter().map(|p| p.id).collect();
    let shown: HashSet<Uuid> = members.iter().map(TeamMember::id).collect();

    allocation_map
        .iter()
        .filter(|((member_id, project_id), hours)| {
            **hours > 0.0 && shown.contains(member_id) && !columns.contains(project_id)
        })
        .map(|((_, project_id), _)| *project_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// membro -> horas de projeto da semana.
pub fn create_member_totals_map(allocation_map: &HashMap<AllocationKey, f64>) -> HashMap<Uuid, f64> {
    let mut totals = HashMap::new();
    for ((member_id, _), hours) in allocation_map {
        *totals.entry(*member_id).or_insert(0.0) += hours;
    }
    totals
}

fn location_matches(holiday: &HolidayRow, member: &TeamMember) -> bool {
    match (&holiday.location, member.location()) {
        (None, _) => true,
        (Some(h), Some(m)) => h.trim().eq_ignore_ascii_case(m.trim()),
        (Some(_), None) => false,
    }
}

/// Horas de feriado do membro: um dia de trabalho por feriado do seu escritório
/// que caia num dia útil.
pub fn holiday_hours_for_member(
    member: &TeamMember,
    holidays: &[HolidayRow],
    config: &ResourcingConfig,
) -> f64 {
    let capacity = config.capacity_for(member.weekly_capacity());
    let per_day = config.daily_hours(capacity);

    holidays
        .iter()
        .filter(|h| h.date.weekday().num_days_from_monday() < config.working_days_per_week)
        .filter(|h| location_matches(h, member))
        .count() as f64
        * per_day
}

/// membro -> horas de ausência (férias + feriados + outras ausências).
pub fn leave_hours_by_member(
    members: &[TeamMember],
    leave: &WeekLeaveData,
    config: &ResourcingConfig,
) -> HashMap<Uuid, f64> {
    let mut totals: HashMap<Uuid, f64> = HashMap::new();

    for row in &leave.annual_leaves {
        *totals.entry(row.member_id).or_insert(0.0) += row.hours;
    }
    for row in &leave.other_leaves {
        *totals.entry(row.member_id).or_insert(0.0) += row.hours;
    }
    for member in members {
        let hours = holiday_hours_for_member(member, &leave.holidays, config);
        if hours > 0.0 {
            *totals.entry(member.id()).or_insert(0.0) += hours;
        }
    }

    totals
}

/// `round(100 * (projeto + ausência) / capacidade)`, ou 0 sem capacidade.
pub fn calculate_utilization_percentage(project_hours: f64, capacity: f64, leave_hours: f64) -> i64 {
    if capacity <= 0.0 {
        return 0;
    }
    (100.0 * (project_hours + leave_hours) / capacity).round() as i64
}

pub fn utilization_level(percentage: i64) -> UtilizationLevel {
    if percentage > 100 {
        UtilizationLevel::Critical
    } else if percentage >= 80 {
        UtilizationLevel::High
    } else {
        UtilizationLevel::Normal
    }
}

/// Monta as linhas da grade: uma por membro, com horas por projeto e utilização.
pub fn build_member_rows(
    members: &[TeamMember],
    allocation_map: &HashMap<AllocationKey, f64>,
    leave_hours: &HashMap<Uuid, f64>,
    config: &ResourcingConfig,
) -> Vec<MemberWeekRow> {
    let totals = create_member_totals_map(allocation_map);

    members
        .iter()
        .map(|member| {
            let id = member.id();
            let capacity = config.capacity_for(member.weekly_capacity());
            let project_hours: BTreeMap<Uuid, f64> = allocation_map
                .iter()
                .filter(|((member_id, _), _)| *member_id == id)
                .map(|((_, project_id), hours)| (*project_id, *hours))
                .collect();
            let total_project_hours = totals.get(&id).copied().unwrap_or(0.0);
            let leave = leave_hours.get(&id).copied().unwrap_or(0.0);
            let utilization_percentage =
                calculate_utilization_percentage(total_project_hours, capacity, leave);

            MemberWeekRow {
                member: member.clone(),
                name: member.name(),
                capacity,
                project_hours,
                total_project_hours,
                leave_hours: leave,
                utilization_percentage,
                utilization_level: utilization_level(utilization_percentage),
            }
        })
        .collect()
}

fn by_name(a: &MemberWeekRow, b: &MemberWeekRow) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

// Valores ausentes vão para o fim
fn by_optional(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_member_rows(rows: &mut [MemberWeekRow], sort: MemberSort) {
    match sort {
        MemberSort::Alphabetical => rows.sort_by(by_name),
        MemberSort::Utilization => rows.sort_by(|a, b| {
            b.utilization_percentage
                .cmp(&a.utilization_percentage)
                .then_with(|| by_name(a, b))
        }),
        MemberSort::Location => rows.sort_by(|a, b| {
            by_optional(a.member.location(), b.member.location()).then_with(|| by_name(a, b))
        }),
        MemberSort::Department => rows.sort_by(|a, b| {
            by_optional(a.member.department(), b.member.department()).then_with(|| by_name(a, b))
        }),
    }
}

// ---
// Edição de célula
// ---

fn trim_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
}

/// Valor inicial do editor da célula.
pub fn format_cell_value(hours: f64, preference: DisplayPreference, capacity: f64) -> String {
    match preference {
        DisplayPreference::Hours => trim_number(hours),
        DisplayPreference::Percentage => {
            if capacity <= 0.0 {
                "0".to_string()
            } else {
                trim_number(hours / capacity * 100.0)
            }
        }
    }
}

/// Converte o texto digitado de volta para horas. Vazio = 0.
pub fn parse_cell_input(input: &str, preference: DisplayPreference, capacity: f64) -> Option<f64> {
    let cleaned = input
        .trim()
        .trim_end_matches('%')
        .trim_end_matches(['h', 'H'])
        .trim()
        .replace(',', ".");

    if cleaned.is_empty() {
        return Some(0.0);
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    match preference {
        DisplayPreference::Hours => Some(value),
        DisplayPreference::Percentage if capacity > 0.0 => Some(value / 100.0 * capacity),
        DisplayPreference::Percentage => None,
    }
}

pub fn hours_changed(previous: f64, next: f64) -> bool {
    (previous - next).abs() > HOURS_EPSILON
}

/// Decide se a entrada do editor deve ser gravada.
/// O valor sugerido pelo editor (`format_cell_value`) devolvido sem edição
/// nunca conta como mudança, mesmo quando o percentual arredonda as horas.
pub fn cell_needs_save(previous: f64, next: f64, preference: DisplayPreference, capacity: f64) -> bool {
    if !hours_changed(previous, next) {
        return false;
    }
    match parse_cell_input(&format_cell_value(previous, preference, capacity), preference, capacity) {
        Some(seeded) => hours_changed(seeded, next),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        allocation::{AnnualLeaveRow, OtherLeaveRow},
        team::{Invite, Profile},
    };

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("date")
    }

    fn profile(name: &str, capacity: Option<f64>, location: Option<&str>, department: Option<&str>) -> TeamMember {
        TeamMember::Active(Profile {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            first_name: Some(name.to_string()),
            last_name: None,
            email: format!("{}@studio.com", name.to_lowercase()),
            avatar_url: None,
            weekly_capacity: capacity,
            location: location.map(String::from),
            department: department.map(String::from),
            job_title: None,
        })
    }

    fn row(member: Uuid, project: Uuid, day: &str, hours: f64) -> AllocationRow {
        AllocationRow { resource_id: member, project_id: project, allocation_date: date(day), hours }
    }

    #[test]
    fn week_start_is_monday() {
        assert_eq!(week_start_of(date("2024-06-13")), date("2024-06-10"));
        assert_eq!(week_start_of(date("2024-06-10")), date("2024-06-10"));
        assert_eq!(week_start_of(date("2024-06-16")), date("2024-06-10"));
        assert_eq!(week_end_of(date("2024-06-10")), date("2024-06-16"));
    }

    #[test]
    fn allocation_map_sums_every_daily_row_in_any_order() {
        let (m, p, q) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut rows = vec![
            row(m, p, "2024-06-10", 3.0),
            row(m, q, "2024-06-10", 2.0),
            row(m, p, "2024-06-12", 4.5),
            row(m, p, "2024-06-11", 0.5),
        ];
        let forward = create_allocation_map(&nest_allocations(&rows));
        rows.reverse();
        let backward = create_allocation_map(&nest_allocations(&rows));

        assert_eq!(forward[&(m, p)], 8.0);
        assert_eq!(forward[&(m, q)], 2.0);
        assert_eq!(forward, backward);
    }

    #[test]
    fn daily_breakdown_wins_over_weekly_total_and_duplicates_accumulate() {
        let (m, p) = (Uuid::new_v4(), Uuid::new_v4());
        let allocations = vec![MemberAllocations {
            member_id: m,
            projects: vec![
                ProjectAllocation {
                    project_id: p,
                    hours: 99.0,
                    daily_breakdown: vec![
                        DailyHours { date: date("2024-06-10"), hours: 2.0 },
                        DailyHours { date: date("2024-06-11"), hours: 3.0 },
                    ],
                },
                ProjectAllocation { project_id: p, hours: 4.0, daily_breakdown: vec![] },
            ],
        }];

        let map = create_allocation_map(&allocations);
        assert_eq!(map[&(m, p)], 9.0);
        assert_eq!(create_member_totals_map(&map)[&m], 9.0);
    }

    #[test]
    fn utilization_percentage_rounds_and_guards_capacity() {
        assert_eq!(calculate_utilization_percentage(30.0, 40.0, 8.0), 95);
        assert_eq!(calculate_utilization_percentage(10.0, 30.0, 0.0), 33);
        assert_eq!(calculate_utilization_percentage(20.0, 0.0, 5.0), 0);
        assert_eq!(calculate_utilization_percentage(20.0, -5.0, 0.0), 0);
    }

    #[test]
    fn utilization_levels_are_ordered() {
        assert_eq!(utilization_level(79), UtilizationLevel::Normal);
        assert_eq!(utilization_level(80), UtilizationLevel::High);
        assert_eq!(utilization_level(100), UtilizationLevel::High);
        assert_eq!(utilization_level(101), UtilizationLevel::Critical);
    }

    #[test]
    fn holidays_only_count_on_working_days_at_matching_location() {
        let config = ResourcingConfig::default();
        let lisbon = profile("Ana", Some(30.0), Some("Lisbon"), None);
        let holidays = vec![
            HolidayRow { name: "Local".into(), date: date("2024-06-13"), location: Some("lisbon".into()) },
            HolidayRow { name: "Other office".into(), date: date("2024-06-12"), location: Some("Porto".into()) },
            HolidayRow { name: "Company".into(), date: date("2024-06-10"), location: None },
            HolidayRow { name: "Weekend".into(), date: date("2024-06-15"), location: None },
        ];

        assert_eq!(holiday_hours_for_member(&lisbon, &holidays, &config), 12.0);
    }

    #[test]
    fn leave_hours_combine_all_sources() {
        let config = ResourcingConfig::default();
        let member = profile("Ana", None, None, None);
        let id = member.id();
        let leave = WeekLeaveData {
            annual_leaves: vec![
                AnnualLeaveRow { member_id: id, date: date("2024-06-11"), hours: 8.0 },
                AnnualLeaveRow { member_id: id, date: date("2024-06-12"), hours: 4.0 },
            ],
            holidays: vec![HolidayRow { name: "Company".into(), date: date("2024-06-10"), location: None }],
            other_leaves: vec![OtherLeaveRow { member_id: id, hours: 2.0 }],
        };

        let totals = leave_hours_by_member(&[member], &leave, &config);
        assert_eq!(totals[&id], 22.0);
    }

    #[test]
    fn member_rows_use_company_capacity_fallback() {
        let config = ResourcingConfig { standard_weekly_capacity: 40.0, ..Default::default() };
        let ana = profile("Ana", None, None, None);
        let project = Uuid::new_v4();
        let map = HashMap::from([((ana.id(), project), 30.0)]);
        let leave = HashMap::from([(ana.id(), 8.0)]);

        let rows = build_member_rows(&[ana], &map, &leave, &config);
        assert_eq!(rows[0].capacity, 40.0);
        assert_eq!(rows[0].project_hours[&project], 30.0);
        assert_eq!(rows[0].utilization_percentage, 95);
        assert_eq!(rows[0].utilization_level, UtilizationLevel::High);
    }

    #[test]
    fn sorting_orders() {
        let config = ResourcingConfig::default();
        let members = vec![
            profile("carla", Some(40.0), Some("Porto"), Some("Design")),
            profile("Bruno", Some(40.0), None, Some("Architecture")),
            profile("Ana", Some(40.0), Some("Lisbon"), None),
        ];
        let project = Uuid::new_v4();
        let map = HashMap::from([
            ((members[0].id(), project), 44.0),
            ((members[1].id(), project), 20.0),
        ]);
        let mut rows = build_member_rows(&members, &map, &HashMap::new(), &config);

        sort_member_rows(&mut rows, MemberSort::Alphabetical);
        assert_eq!(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["Ana", "Bruno", "carla"]);

        sort_member_rows(&mut rows, MemberSort::Utilization);
        assert_eq!(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["carla", "Bruno", "Ana"]);

        sort_member_rows(&mut rows, MemberSort::Location);
        assert_eq!(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["Ana", "carla", "Bruno"]);

        sort_member_rows(&mut rows, MemberSort::Department);
        assert_eq!(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["Bruno", "carla", "Ana"]);
    }

    #[test]
    fn pending_members_get_rows_too() {
        let config = ResourcingConfig::default();
        let pending = TeamMember::Pending(Invite {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            email: None,
            first_name: Some("Rui".into()),
            last_name: None,
            weekly_capacity: Some(20.0),
            location: None,
            department: None,
            job_title: None,
        });
        let map = HashMap::from([((pending.id(), Uuid::new_v4()), 25.0)]);
        let rows = build_member_rows(&[pending], &map, &HashMap::new(), &config);
        assert_eq!(rows[0].utilization_percentage, 125);
        assert_eq!(rows[0].utilization_level, UtilizationLevel::Critical);
    }

    #[test]
    fn cell_values_round_trip_through_display_preferences() {
        assert_eq!(format_cell_value(12.0, DisplayPreference::Hours, 40.0), "12");
        assert_eq!(format_cell_value(7.25, DisplayPreference::Hours, 40.0), "7.25");
        assert_eq!(format_cell_value(0.0, DisplayPreference::Hours, 40.0), "0");
        assert_eq!(format_cell_value(10.0, DisplayPreference::Percentage, 40.0), "25");
        assert_eq!(format_cell_value(7.0, DisplayPreference::Percentage, 40.0), "17.5");
        assert_eq!(format_cell_value(1.0, DisplayPreference::Percentage, 30.0), "3.33");
        assert_eq!(format_cell_value(10.0, DisplayPreference::Percentage, 0.0), "0");

        assert_eq!(parse_cell_input("12", DisplayPreference::Hours, 40.0), Some(12.0));
        assert_eq!(parse_cell_input(" 7,5h ", DisplayPreference::Hours, 40.0), Some(7.5));
        assert_eq!(parse_cell_input("25%", DisplayPreference::Percentage, 40.0), Some(10.0));
        assert_eq!(parse_cell_input("", DisplayPreference::Hours, 40.0), Some(0.0));
        assert_eq!(parse_cell_input("abc", DisplayPreference::Hours, 40.0), None);
        assert_eq!(parse_cell_input("-3", DisplayPreference::Hours, 40.0), None);
        assert_eq!(parse_cell_input("50", DisplayPreference::Percentage, 0.0), None);
    }

    #[test]
    fn edits_within_epsilon_are_not_changes() {
        assert!(!hours_changed(12.0, 12.005));
        assert!(hours_changed(12.0, 12.02));
        assert!(hours_changed(0.0, 12.0));
    }

    #[test]
    fn unedited_percentage_seed_is_not_saved() {
        // 7 h de 40 h: o editor mostra "17.5" e devolve o mesmo texto
        for (hours, capacity) in [(7.0, 40.0), (3.0, 30.0), (1.0, 30.0), (13.0, 37.5), (0.5, 160.0)] {
            let seed = format_cell_value(hours, DisplayPreference::Percentage, capacity);
            let parsed = parse_cell_input(&seed, DisplayPreference::Percentage, capacity).expect("seed");
            assert!(
                !cell_needs_save(hours, parsed, DisplayPreference::Percentage, capacity),
                "{hours} h em {capacity} h ({seed}%) foi tratado como edição"
            );
        }
    }

    #[test]
    fn edited_percentage_is_saved() {
        let parsed = parse_cell_input("20", DisplayPreference::Percentage, 40.0).expect("input");
        assert!(cell_needs_save(7.0, parsed, DisplayPreference::Percentage, 40.0));

        // capacidade alta: "0.17" volta como 1.02 h, além da tolerância, e ainda assim não grava
        let seed = format_cell_value(1.0, DisplayPreference::Percentage, 600.0);
        assert_eq!(seed, "0.17");
        let parsed = parse_cell_input(&seed, DisplayPreference::Percentage, 600.0).expect("seed");
        assert!(hours_changed(1.0, parsed));
        assert!(!cell_needs_save(1.0, parsed, DisplayPreference::Percentage, 600.0));

        assert!(cell_needs_save(0.0, 8.0, DisplayPreference::Hours, 40.0));
        assert!(!cell_needs_save(8.0, 8.004, DisplayPreference::Hours, 40.0));
    }

    #[test]
    fn allocated_projects_outside_the_columns_are_found() {
        let shown = profile("Ana", Some(40.0), None, Some("Design"));
        let hidden = profile("Rui", Some(40.0), None, Some("Build"));
        let column = ProjectSummary { id: Uuid::new_v4(), code: "P-1".into(), name: "Casa".into(), department: None };
        let completed = Uuid::new_v4();
        let other_department = Uuid::new_v4();

        let map = HashMap::from([
            ((shown.id(), column.id), 10.0),
            ((shown.id(), completed), 6.0),
            ((hidden.id(), other_department), 8.0),
        ]);

        let missing = projects_missing_from_columns(&[column], &[shown], &map);
        assert_eq!(missing, vec![completed]);
    }
}
