pub mod auth_form;
pub mod confirm_dialog;
pub mod countdown;
pub mod notice_bar;
pub mod progress_bar;
pub mod question_nav;
pub mod question_view;
pub mod result_view;
pub mod stats_view;
pub mod submission_list;
pub mod test_list;
