//! The student → project → weekly selection and the CRUD operations that move
//! it.

use serde::Serialize;
use time::Date;

use crate::error::CrudError;
use crate::types::{Document, Project, Student, Weekly};

/// What the editor currently shows.
///
/// The student is held by name. Project and weekly are indices into the
/// live lists and are re-pointed whenever an earlier sibling is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub student: Option<String>,
    pub project: Option<usize>,
    pub weekly: Option<usize>,
}

/// Which operations the current selection allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Enablement {
    pub remove_student: bool,
    pub add_project: bool,
    pub remove_project: bool,
    pub add_weekly: bool,
    pub delete_weekly: bool,
}

/// Owns the document and the selection pointing into it.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    document: Document,
    selection: Selection,
}

impl SelectionController {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: Selection::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Swap in another document and clear the selection.
    pub fn replace_document(&mut self, document: Document) -> Document {
        self.selection = Selection::default();
        std::mem::replace(&mut self.document, document)
    }

    // ---------------------------------------------------------------------
    // Derived queries
    // ---------------------------------------------------------------------

    pub fn current_student(&self) -> Option<&Student> {
        self.document.students.get(self.selection.student.as_deref()?)
    }

    pub fn current_student_projects(&self) -> Option<&[Project]> {
        self.current_student().map(|s| s.projects.as_slice())
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current_student_projects()?.get(self.selection.project?)
    }

    pub fn current_weeklies(&self) -> Option<&[Weekly]> {
        self.current_project().map(|p| p.weeklies.as_slice())
    }

    pub fn current_weekly(&self) -> Option<&Weekly> {
        self.current_weeklies()?.get(self.selection.weekly?)
    }

    pub(crate) fn current_project_mut(&mut self) -> Option<&mut Project> {
        let index = self.selection.project?;
        self.current_student_mut()?.projects.get_mut(index)
    }

    pub(crate) fn current_weekly_mut(&mut self) -> Option<&mut Weekly> {
        let index = self.selection.weekly?;
        self.current_project_mut()?.weeklies.get_mut(index)
    }

    fn current_student_mut(&mut self) -> Option<&mut Student> {
        let name = self.selection.student.as_deref()?;
        self.document.students.get_mut(name)
    }

    pub fn enablement(&self) -> Enablement {
        let has_student = self.current_student().is_some();
        let has_project = self.current_project().is_some();
        Enablement {
            remove_student: has_student,
            add_project: has_student,
            remove_project: has_project,
            add_weekly: has_project,
            delete_weekly: self.current_weekly().is_some(),
        }
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Select a student by name, or clear the selection with `None`.
    /// Switching to another student clears project and weekly.
    pub fn select_student(&mut self, name: Option<&str>) -> Result<(), CrudError> {
        let Some(name) = name else {
            self.selection = Selection::default();
            return Ok(());
        };
        if !self.document.students.contains_key(name) {
            return Err(CrudError::UnknownStudent(name.to_string()));
        }
        if self.selection.student.as_deref() != Some(name) {
            self.selection = Selection {
                student: Some(name.to_string()),
                project: None,
                weekly: None,
            };
        }
        Ok(())
    }

    /// Select a project of the current student. Switching to another project
    /// clears the weekly.
    pub fn select_project(&mut self, index: Option<usize>) -> Result<(), CrudError> {
        let len = self
            .current_student_projects()
            .ok_or(CrudError::NoStudentSelected)?
            .len();
        match index {
            None => {
                self.selection.project = None;
                self.selection.weekly = None;
            }
            Some(index) if index >= len => return Err(CrudError::ProjectOutOfRange { index, len }),
            Some(index) => {
                if self.selection.project != Some(index) {
                    self.selection.project = Some(index);
                    self.selection.weekly = None;
                }
            }
        }
        Ok(())
    }

    pub fn select_weekly(&mut self, index: Option<usize>) -> Result<(), CrudError> {
        let len = self
            .current_weeklies()
            .ok_or(CrudError::NoProjectSelected)?
            .len();
        match index {
            Some(index) if index >= len => Err(CrudError::WeeklyOutOfRange { index, len }),
            index => {
                self.selection.weekly = index;
                Ok(())
            }
        }
    }

    // ---------------------------------------------------------------------
    // CRUD
    // ---------------------------------------------------------------------

    /// Insert an empty student and select it. Returns the stored (trimmed)
    /// name.
    pub fn add_student(&mut self, name: &str) -> Result<String, CrudError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CrudError::EmptyName);
        }
        if self.document.students.contains_key(name) {
            return Err(CrudError::StudentExists(name.to_string()));
        }
        self.document
            .students
            .insert(name.to_string(), Student::default());
        self.select_student(Some(name))?;
        Ok(name.to_string())
    }

    /// Remove any student. If it was selected, the whole selection clears.
    pub fn remove_student(&mut self, name: &str) -> Result<Student, CrudError> {
        let removed = self
            .document
            .students
            .remove(name)
            .ok_or_else(|| CrudError::UnknownStudent(name.to_string()))?;
        if self.selection.student.as_deref() == Some(name) {
            self.selection = Selection::default();
        }
        Ok(removed)
    }

    pub fn remove_selected_student(&mut self) -> Result<Student, CrudError> {
        let name = self
            .selection
            .student
            .clone()
            .ok_or(CrudError::NoStudentSelected)?;
        self.remove_student(&name)
    }

    /// Append a project to the current student and select it. A blank name
    /// becomes `Projekt N`.
    pub fn add_project(&mut self, name: &str, today: Date) -> Result<usize, CrudError> {
        let student = self.current_student_mut().ok_or(CrudError::NoStudentSelected)?;
        let name = match name.trim() {
            "" => format!("Projekt {}", student.projects.len() + 1),
            name => name.to_string(),
        };
        student.projects.push(Project::new(name, today));
        let index = student.projects.len() - 1;

        self.selection.project = Some(index);
        self.selection.weekly = None;
        Ok(index)
    }

    /// Remove the selected project and clear project and weekly selection.
    pub fn remove_project(&mut self) -> Result<Project, CrudError> {
        let index = self.selection.project.ok_or(CrudError::NoProjectSelected)?;
        self.remove_project_at(index)
    }

    /// Remove the project at `index`. The selection keeps pointing at the
    /// same project if another one was removed.
    pub fn remove_project_at(&mut self, index: usize) -> Result<Project, CrudError> {
        let student = self.current_student_mut().ok_or(CrudError::NoStudentSelected)?;
        let len = student.projects.len();
        if index >= len {
            return Err(CrudError::ProjectOutOfRange { index, len });
        }
        let removed = student.projects.remove(index);

        match self.selection.project {
            Some(selected) if selected == index => {
                self.selection.project = None;
                self.selection.weekly = None;
            }
            Some(selected) if selected > index => self.selection.project = Some(selected - 1),
            _ => {}
        }
        Ok(removed)
    }

    /// Append a weekly dated `today` to the current project and select it.
    ///
    /// `planned` is seeded from `next_planned` of the last weekly in list
    /// order, which is not necessarily the latest by date.
    pub fn add_weekly(&mut self, today: Date) -> Result<usize, CrudError> {
        let project = self.current_project_mut().ok_or(CrudError::NoProjectSelected)?;
        let planned = project
            .weeklies
            .last()
            .map(|w| w.next_planned.clone())
            .unwrap_or_default();
        project.weeklies.push(Weekly::new(today, planned));
        let index = project.weeklies.len() - 1;

        self.selection.weekly = Some(index);
        Ok(index)
    }

    /// Remove the selected weekly and clear the weekly selection.
    pub fn delete_weekly(&mut self) -> Result<Weekly, CrudError> {
        let index = self.selection.weekly.ok_or(CrudError::NoWeeklySelected)?;
        self.remove_weekly_at(index)
    }

    pub fn remove_weekly_at(&mut self, index: usize) -> Result<Weekly, CrudError> {
        let project = self.current_project_mut().ok_or(CrudError::NoProjectSelected)?;
        let len = project.weeklies.len();
        if index >= len {
            return Err(CrudError::WeeklyOutOfRange { index, len });
        }
        let removed = project.weeklies.remove(index);

        match self.selection.weekly {
            Some(selected) if selected == index => self.selection.weekly = None,
            Some(selected) if selected > index => self.selection.weekly = Some(selected - 1),
            _ => {}
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 01 - 01);

    /// Alice with two projects (3 and 1 weeklies) and Bob with one project.
    fn controller() -> SelectionController {
        let mut c = SelectionController::default();
        c.add_student("Alice").unwrap();
        c.add_project("Thesis", TODAY).unwrap();
        for _ in 0..3 {
            c.add_weekly(TODAY).unwrap();
        }
        c.add_project("Side", TODAY).unwrap();
        c.add_weekly(TODAY).unwrap();
        c.add_student("Bob").unwrap();
        c.add_project("Robot", TODAY).unwrap();
        c.select_student(None).unwrap();
        c
    }

    fn select(c: &mut SelectionController, student: &str, project: usize, weekly: usize) {
        c.select_student(Some(student)).unwrap();
        c.select_project(Some(project)).unwrap();
        c.select_weekly(Some(weekly)).unwrap();
    }

    #[test]
    fn selecting_another_student_clears_descendants() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 2);
        assert!(c.current_weekly().is_some());

        c.select_student(Some("Bob")).unwrap();
        assert!(c.current_project().is_none());
        assert!(c.current_weekly().is_none());
        assert_eq!(c.selection().project, None);
        assert_eq!(c.selection().weekly, None);
    }

    #[test]
    fn reselecting_same_student_keeps_descendants() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 1);
        c.select_student(Some("Alice")).unwrap();
        assert_eq!(c.selection().weekly, Some(1));
    }

    #[test]
    fn selecting_another_project_clears_weekly() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 2);
        c.select_project(Some(1)).unwrap();
        assert_eq!(c.selection().weekly, None);
        assert_eq!(c.current_project().unwrap().name, "Side");
    }

    #[test]
    fn invalid_navigation_leaves_selection_untouched() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 2);
        let before = c.selection().clone();

        assert_eq!(
            c.select_student(Some("Nobody")),
            Err(CrudError::UnknownStudent("Nobody".to_string()))
        );
        assert_eq!(
            c.select_project(Some(5)),
            Err(CrudError::ProjectOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(
            c.select_weekly(Some(3)),
            Err(CrudError::WeeklyOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(c.selection(), &before);
    }

    #[test]
    fn navigation_requires_ancestors() {
        let mut c = controller();
        assert_eq!(c.select_project(Some(0)), Err(CrudError::NoStudentSelected));
        c.select_student(Some("Alice")).unwrap();
        assert_eq!(c.select_weekly(Some(0)), Err(CrudError::NoProjectSelected));
    }

    #[test]
    fn enablement_follows_selection() {
        let mut c = controller();
        assert_eq!(c.enablement(), Enablement::default());

        c.select_student(Some("Alice")).unwrap();
        let flags = c.enablement();
        assert!(flags.add_project && flags.remove_student);
        assert!(!flags.remove_project && !flags.add_weekly && !flags.delete_weekly);

        c.select_project(Some(0)).unwrap();
        let flags = c.enablement();
        assert!(flags.remove_project && flags.add_weekly);
        assert!(!flags.delete_weekly);

        c.select_weekly(Some(0)).unwrap();
        assert!(c.enablement().delete_weekly);

        c.delete_weekly().unwrap();
        assert!(!c.enablement().delete_weekly);
    }

    #[test]
    fn add_student_rejects_duplicates_and_blank_names() {
        let mut c = controller();
        c.select_student(Some("Bob")).unwrap();

        assert_eq!(
            c.add_student("  Alice "),
            Err(CrudError::StudentExists("Alice".to_string()))
        );
        assert_eq!(c.add_student("   "), Err(CrudError::EmptyName));
        assert_eq!(c.selection().student.as_deref(), Some("Bob"));
        assert_eq!(c.document().students.len(), 2);
    }

    #[test]
    fn add_student_trims_and_selects() {
        let mut c = controller();
        assert_eq!(c.add_student("  Carol ").unwrap(), "Carol");
        assert_eq!(c.selection().student.as_deref(), Some("Carol"));
        assert_eq!(c.current_student_projects(), Some(&[][..]));
    }

    #[test]
    fn add_project_uses_default_dates_and_placeholder_name() {
        let mut c = controller();
        c.select_student(Some("Bob")).unwrap();
        let index = c.add_project("  ", TODAY).unwrap();

        assert_eq!(index, 1);
        assert_eq!(c.selection().project, Some(1));
        let project = c.current_project().unwrap();
        assert_eq!(project.name, "Projekt 2");
        assert_eq!(project.start_date, TODAY);
        assert_eq!(project.end_date, date!(2024 - 03 - 31));
    }

    #[test]
    fn add_project_requires_student() {
        let mut c = controller();
        assert_eq!(c.add_project("x", TODAY), Err(CrudError::NoStudentSelected));
    }

    #[test]
    fn add_weekly_seeds_planned_from_last_in_list_order() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 0);
        c.current_weekly_mut().unwrap().next_planned = "from first".to_string();
        c.select_weekly(Some(2)).unwrap();
        {
            let last = c.current_weekly_mut().unwrap();
            last.next_planned = "from last".to_string();
            // Earlier date than the first weekly; list order still wins.
            last.date = date!(2023 - 12 - 01);
        }

        let index = c.add_weekly(date!(2024 - 01 - 15)).unwrap();
        assert_eq!(index, 3);
        let weekly = c.current_weekly().unwrap();
        assert_eq!(weekly.planned, "from last");
        assert_eq!(weekly.date, date!(2024 - 01 - 15));
        assert_eq!(weekly.title, "");
    }

    #[test]
    fn first_weekly_starts_with_empty_plan() {
        let mut c = controller();
        c.select_student(Some("Bob")).unwrap();
        c.select_project(Some(0)).unwrap();
        c.add_weekly(TODAY).unwrap();
        assert_eq!(c.current_weekly().unwrap().planned, "");
    }

    #[test]
    fn removing_selected_student_clears_everything() {
        let mut c = controller();
        select(&mut c, "Alice", 1, 0);
        let removed = c.remove_selected_student().unwrap();

        assert_eq!(removed.projects.len(), 2);
        assert_eq!(c.selection(), &Selection::default());
        assert!(!c.document().students.contains_key("Alice"));
    }

    #[test]
    fn removing_other_student_keeps_selection() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 1);
        c.remove_student("Bob").unwrap();
        assert_eq!(c.selection().weekly, Some(1));
        assert_eq!(
            c.remove_student("Bob").unwrap_err(),
            CrudError::UnknownStudent("Bob".to_string())
        );
    }

    #[test]
    fn removing_selected_project_clears_project_and_weekly() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 2);
        let removed = c.remove_project().unwrap();

        assert_eq!(removed.name, "Thesis");
        assert_eq!(c.selection().student.as_deref(), Some("Alice"));
        assert_eq!(c.selection().project, None);
        assert_eq!(c.selection().weekly, None);
        assert_eq!(c.current_student_projects().unwrap().len(), 1);
    }

    #[test]
    fn removing_earlier_project_repoints_selection() {
        let mut c = controller();
        select(&mut c, "Alice", 1, 0);
        c.remove_project_at(0).unwrap();

        assert_eq!(c.selection().project, Some(0));
        assert_eq!(c.selection().weekly, Some(0));
        assert_eq!(c.current_project().unwrap().name, "Side");
    }

    #[test]
    fn removing_later_weekly_keeps_pointer() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 0);
        c.remove_weekly_at(2).unwrap();
        assert_eq!(c.selection().weekly, Some(0));
    }

    #[test]
    fn removing_earlier_weekly_repoints_selection() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 2);
        c.current_weekly_mut().unwrap().title = "third".to_string();

        c.remove_weekly_at(0).unwrap();
        assert_eq!(c.selection().weekly, Some(1));
        assert_eq!(c.current_weekly().unwrap().title, "third");
    }

    #[test]
    fn deleting_selected_weekly_does_not_select_replacement() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 1);
        c.delete_weekly().unwrap();

        assert_eq!(c.selection().weekly, None);
        assert_eq!(c.selection().project, Some(0));
        assert_eq!(c.current_weeklies().unwrap().len(), 2);
        assert_eq!(c.delete_weekly(), Err(CrudError::NoWeeklySelected));
    }

    #[test]
    fn replace_document_clears_selection() {
        let mut c = controller();
        select(&mut c, "Alice", 0, 0);
        let old = c.replace_document(Document::new());
        assert_eq!(old.students.len(), 2);
        assert_eq!(c.selection(), &Selection::default());
        assert!(c.current_student().is_none());
    }
}
