use crate::model::Student;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentMember {
    pub id: i64,
    pub name: String,
    pub roll: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentGroup {
    pub department: String,
    pub count: usize,
    pub students: Vec<DepartmentMember>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentReport {
    pub generated_at: String,
    pub total_students: usize,
    pub total_departments: usize,
    pub departments: Vec<DepartmentGroup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub generated_at: String,
    pub total_students: usize,
    pub total_departments: usize,
    pub departments: Vec<DepartmentCount>,
}

fn generated_at() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Departments in name order; members by name, then roll.
fn group_by_department(students: &[Student]) -> BTreeMap<&str, Vec<&Student>> {
    let mut groups: BTreeMap<&str, Vec<&Student>> = BTreeMap::new();
    for s in students {
        groups.entry(s.department.as_str()).or_default().push(s);
    }
    for members in groups.values_mut() {
        members.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.roll.cmp(&b.roll)));
    }
    groups
}

fn percent_1dp(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

pub fn department_report(students: &[Student]) -> DepartmentReport {
    let groups = group_by_department(students);
    DepartmentReport {
        generated_at: generated_at(),
        total_students: students.len(),
        total_departments: groups.len(),
        departments: groups
            .into_iter()
            .map(|(department, members)| DepartmentGroup {
                department: department.to_string(),
                count: members.len(),
                students: members
                    .into_iter()
                    .map(|s| DepartmentMember {
                        id: s.id,
                        name: s.name.clone(),
                        roll: s.roll.clone(),
                        email: s.email.clone(),
                        phone: s.phone.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn summary_report(students: &[Student]) -> SummaryReport {
    let total = students.len();
    let groups = group_by_department(students);
    SummaryReport {
        generated_at: generated_at(),
        total_students: total,
        total_departments: groups.len(),
        departments: groups
            .into_iter()
            .map(|(department, members)| DepartmentCount {
                department: department.to_string(),
                count: members.len(),
                percentage: percent_1dp(members.len(), total),
            })
            .collect(),
    }
}
