//! Built-in seed catalog: the reference set of valid classification codes.
//!
//! Codes are the stable identifiers the extraction pipeline validates against;
//! display names are presentation-only. The feature list is a *seed*: new
//! feature codes discovered at runtime are registered alongside it.

/// (code, display_name, hr_category)
pub(crate) const MODULES: &[(&str, &str, &str)] = &[
    // internal_communication
    ("chat", "Chat", "internal_communication"),
    ("internal_social_network", "Internal Social Network", "internal_communication"),
    ("magazine", "Internal Magazine", "internal_communication"),
    ("live_streaming", "Live Streaming", "internal_communication"),
    ("knowledge_libraries", "Knowledge Libraries", "internal_communication"),
    ("quick_links", "Quick Links", "internal_communication"),
    // hr_administration
    ("digital_employee_file", "Digital Employee File", "hr_administration"),
    ("documents", "Documents", "hr_administration"),
    ("files", "Files", "hr_administration"),
    ("company_policies", "Company Policies", "hr_administration"),
    ("forms_and_workflows", "Forms and Workflows", "hr_administration"),
    ("org_chart", "Org Chart", "hr_administration"),
    ("digital_access", "Digital Access", "hr_administration"),
    ("security_and_privacy", "Security and Privacy", "hr_administration"),
    ("payroll", "Payroll", "hr_administration"),
    // talent_acquisition
    ("internal_job_postings", "Internal Job Postings", "talent_acquisition"),
    ("referral_program", "Referral Program", "talent_acquisition"),
    ("onboarding", "Onboarding", "talent_acquisition"),
    ("ats", "ATS", "talent_acquisition"),
    ("ai_recruiter", "AI Recruiter", "talent_acquisition"),
    ("recruitment", "Recruitment", "talent_acquisition"),
    // talent_development
    ("performance_review", "Performance Review", "talent_development"),
    ("goals_and_okrs", "Goals and OKRs", "talent_development"),
    ("development_plan", "Development Plan", "talent_development"),
    ("learning", "Learning / LMS", "talent_development"),
    ("succession_planning", "Succession Planning", "talent_development"),
    ("prebuilt_courses", "Prebuilt Courses", "talent_development"),
    // employee_experience
    ("people_experience", "People Experience", "employee_experience"),
    ("surveys", "Surveys", "employee_experience"),
    ("kudos", "Kudos", "employee_experience"),
    ("birthdays_and_anniversaries", "Birthdays and Anniversaries", "employee_experience"),
    ("events", "Events", "employee_experience"),
    // compensation_and_benefits
    ("perks_and_benefits", "Perks and Benefits", "compensation_and_benefits"),
    ("marketplace", "Marketplace", "compensation_and_benefits"),
    ("benefits_platform", "Benefits Platform", "compensation_and_benefits"),
    // operations_and_workplace
    ("time_off", "Time Off", "operations_and_workplace"),
    ("time_tracking", "Time Tracking", "operations_and_workplace"),
    ("space_reservation", "Space Reservation", "operations_and_workplace"),
    ("service_management", "Service Management", "operations_and_workplace"),
];

/// (code, display_name, theme, linked_module)
///
/// A linked module means the pain implies that module; the validator
/// auto-fills it when the model omits one.
pub(crate) const PAIN_SUBTYPES: &[(&str, &str, &str, Option<&str>)] = &[
    // technology
    ("fragmented_tools", "Fragmented tools", "technology", None),
    ("low_adoption", "Low adoption", "technology", None),
    ("no_mobile_access", "No mobile access", "technology", None),
    ("outdated_technology", "Outdated technology", "technology", None),
    ("integration_issues", "Integration issues", "technology", None),
    ("vendor_fatigue", "Vendor fatigue", "technology", None),
    ("poor_ux", "Poor UX", "technology", None),
    ("it_dependency", "IT dependency", "technology", None),
    // processes
    ("manual_processes", "Manual processes", "processes", None),
    ("process_bottlenecks", "Process bottlenecks", "processes", None),
    ("manager_burden", "Manager burden", "processes", None),
    ("employee_self_service", "No self service", "processes", None),
    ("hr_admin_overload", "HR admin overload", "processes", None),
    ("paper_waste", "Paper waste", "processes", None),
    // communication
    ("communication_gaps", "Communication gaps", "communication", None),
    ("deskless_exclusion", "Deskless exclusion", "communication", None),
    ("email_unreachable", "No corporate email", "communication", None),
    ("information_asymmetry", "Information asymmetry", "communication", None),
    ("internal_comm_overload", "Channel overload", "communication", None),
    ("multi_site_silos", "Multi-site silos", "communication", None),
    // talent
    ("turnover_retention", "High turnover", "talent", None),
    ("employer_brand", "Weak employer brand", "talent", None),
    // engagement
    ("cultural_disconnection", "Cultural disconnection", "engagement", None),
    ("language_barriers", "Language barriers", "engagement", None),
    ("no_sense_of_belonging", "No sense of belonging", "engagement", None),
    ("remote_hybrid_challenges", "Remote/hybrid challenges", "engagement", None),
    // data
    ("poor_visibility", "Poor visibility", "data", None),
    ("reporting_limitations", "Reporting limitations", "data", None),
    ("data_silos", "Data silos", "data", None),
    ("manual_reporting", "Manual reporting", "data", None),
    ("no_real_time_data", "No real-time data", "data", None),
    // compliance
    ("scaling_pain", "Does not scale", "compliance", None),
    ("compliance_risk", "Compliance risk", "compliance", None),
    ("labor_law_complexity", "Labor law complexity", "compliance", None),
    ("government_reporting", "Government reporting", "compliance", None),
    ("multi_country_complexity", "Multi-country complexity", "compliance", None),
    ("data_privacy", "Data privacy", "compliance", None),
    ("audit_readiness", "Audit readiness", "compliance", None),
    ("cost_burden", "Excessive cost", "compliance", None),
    ("security_concerns", "Security concerns", "compliance", None),
    ("union_relations", "Union relations", "compliance", None),
    ("seasonal_workforce", "Seasonal workforce", "compliance", None),
    ("contractor_management", "Contractor management", "compliance", None),
    // module-linked: internal_communication
    ("informal_channel_use", "Informal channels", "communication", Some("chat")),
    ("top_down_only", "Top-down only", "communication", Some("internal_social_network")),
    ("fragmented_news", "Scattered news", "communication", Some("magazine")),
    ("crisis_communication", "No crisis channel", "communication", Some("live_streaming")),
    ("scattered_knowledge", "Scattered knowledge", "communication", Some("knowledge_libraries")),
    ("resource_findability", "Unreachable resources", "communication", Some("quick_links")),
    // module-linked: hr_administration
    ("paper_based_records", "Paper records", "processes", Some("digital_employee_file")),
    ("document_chaos", "Document chaos", "processes", Some("documents")),
    ("file_disorganization", "Disorganized files", "processes", Some("files")),
    ("policy_unacknowledged", "Unacknowledged policies", "processes", Some("company_policies")),
    ("manual_approvals", "Manual approvals", "processes", Some("forms_and_workflows")),
    ("org_opacity", "Opaque structure", "processes", Some("org_chart")),
    ("access_friction", "Unmanaged access", "processes", Some("digital_access")),
    ("data_exposure_risk", "Data exposure risk", "processes", Some("security_and_privacy")),
    ("payroll_complexity", "Payroll complexity", "processes", Some("payroll")),
    // module-linked: talent_acquisition
    ("no_internal_mobility", "No internal mobility", "talent", Some("internal_job_postings")),
    ("untapped_referrals", "Untapped referrals", "talent", Some("referral_program")),
    ("onboarding_delays", "Deficient onboarding", "talent", Some("onboarding")),
    ("manual_candidate_tracking", "Manual candidate tracking", "talent", Some("ats")),
    ("screening_overload", "Screening overload", "talent", Some("ai_recruiter")),
    ("recruitment_disorganization", "Disorganized recruitment", "talent", Some("recruitment")),
    // module-linked: talent_development
    ("no_performance_tracking", "No performance review", "talent", Some("performance_review")),
    ("skill_gap_blind", "Invisible skill gaps", "talent", Some("performance_review")),
    ("misaligned_goals", "Misaligned goals", "talent", Some("goals_and_okrs")),
    ("no_career_path", "No career path", "talent", Some("development_plan")),
    ("training_gaps", "Training gaps", "talent", Some("learning")),
    ("training_compliance", "Untracked training", "talent", Some("learning")),
    ("succession_risk", "Succession risk", "talent", Some("succession_planning")),
    ("no_training_content", "No training content", "talent", Some("prebuilt_courses")),
    // module-linked: employee_experience
    ("poor_employee_journey", "Fragmented journey", "engagement", Some("people_experience")),
    ("engagement_blind_spot", "Unmeasured engagement", "engagement", Some("surveys")),
    ("feedback_absence", "No continuous feedback", "engagement", Some("surveys")),
    ("recognition_deficit", "Recognition deficit", "engagement", Some("kudos")),
    ("milestones_ignored", "Uncelebrated milestones", "engagement", Some("birthdays_and_anniversaries")),
    ("event_disorganization", "Disorganized events", "engagement", Some("events")),
    // module-linked: compensation_and_benefits
    ("manual_benefits_enrollment", "Manual benefits enrollment", "compensation", Some("perks_and_benefits")),
    ("perks_invisible", "Invisible perks", "compensation", Some("marketplace")),
    ("benefits_fragmentation", "Fragmented benefits", "compensation", Some("benefits_platform")),
    // module-linked: operations_and_workplace
    ("absence_management", "Uncontrolled absences", "operations", Some("time_off")),
    ("time_attendance_chaos", "Attendance chaos", "operations", Some("time_tracking")),
    ("shift_scheduling", "Unplanned shifts", "operations", Some("time_tracking")),
    ("overtime_compliance", "Uncontrolled overtime", "operations", Some("time_tracking")),
    ("space_conflicts", "Space conflicts", "operations", Some("space_reservation")),
    ("no_service_desk", "No service desk", "operations", Some("service_management")),
];

/// (code, display_name)
pub(crate) const DEAL_FRICTION_SUBTYPES: &[(&str, &str)] = &[
    ("budget", "Budget constraint"),
    ("timing", "Misaligned timing"),
    ("decision_maker", "Missing decision maker"),
    ("legal", "Legal/compliance review"),
    ("technical", "Technical complexity"),
    ("change_management", "Change resistance"),
    ("champion_risk", "Champion at risk"),
    ("incumbent_lock_in", "Incumbent lock-in"),
    ("scope_mismatch", "Scope mismatch"),
    ("security_review", "Security review"),
    ("regional_requirements", "Regional requirements"),
    ("competing_priorities", "Competing priorities"),
];

/// (code, display_name)
pub(crate) const FAQ_SUBTYPES: &[(&str, &str)] = &[
    ("pricing", "Pricing"),
    ("implementation", "Implementation"),
    ("integration", "Integrations"),
    ("security", "Security"),
    ("customization", "Customization"),
    ("mobile", "Mobile App"),
    ("support", "Support"),
    ("migration", "Data migration"),
    ("scalability", "Scalability"),
    ("analytics", "Analytics and reporting"),
    ("languages", "Languages"),
    ("adoption", "Adoption"),
    ("compliance", "Regulatory compliance"),
    ("roi", "ROI and business case"),
    ("content_management", "Content management"),
];

/// (code, display_name)
pub(crate) const COMPETITIVE_RELATIONSHIPS: &[(&str, &str)] = &[
    ("currently_using", "Currently using"),
    ("evaluating", "Evaluating"),
    ("migrating_from", "Migrating from"),
    ("comparing", "Comparing"),
    ("mentioned", "Mentioned"),
    ("previously_used", "Previously used"),
];

/// (code, display_name, suggested_module)
pub(crate) const SEED_FEATURES: &[(&str, &str, Option<&str>)] = &[
    ("payroll_integration", "Payroll integration", Some("payroll")),
    ("ats_module", "ATS module", Some("ats")),
    ("ai_recruiter", "AI recruiter", Some("ai_recruiter")),
    ("succession_planning", "Succession planning", Some("succession_planning")),
    ("native_benefits_platform", "Benefits platform", Some("benefits_platform")),
    ("prebuilt_courses", "Prebuilt courses", Some("prebuilt_courses")),
    ("recruitment_module", "Recruitment module", Some("recruitment")),
    ("advanced_analytics", "Advanced analytics", None),
    ("bi_dashboard", "BI dashboard", None),
    ("sso_integration", "SSO integration", Some("security_and_privacy")),
    ("api_access", "API access", Some("digital_access")),
    ("offline_mode", "Offline mode", None),
    ("multi_language_content", "Multi-language content", None),
    ("shift_scheduling", "Shift scheduling", Some("time_tracking")),
    ("geofencing", "Geofencing", Some("time_tracking")),
    ("expense_management", "Expense management", None),
    ("compensation_management", "Compensation management", None),
    ("nine_box_grid", "Nine box grid", Some("performance_review")),
    ("scorm_support", "SCORM support", Some("learning")),
    ("whatsapp_integration", "WhatsApp integration", Some("chat")),
    ("sap_integration", "SAP integration", None),
    ("workday_integration", "Workday integration", None),
    ("custom_branding", "Custom branding", None),
    ("push_notifications", "Push notifications", None),
    ("video_conferencing", "Video conferencing", Some("live_streaming")),
    ("ai_chatbot", "AI chatbot", Some("chat")),
    ("predictive_analytics", "Predictive analytics", None),
    ("employee_wellness", "Employee wellness", Some("people_experience")),
    ("exit_interviews", "Exit interviews", Some("surveys")),
    ("anonymous_feedback", "Anonymous feedback", Some("surveys")),
];

/// (name, region)
pub(crate) const COMPETITORS: &[(&str, &str)] = &[
    // LATAM
    ("Buk", "latam"), ("Factorial", "latam"), ("Pandape", "latam"), ("Rankmi", "latam"),
    ("GoIntegro", "latam"), ("Visma", "latam"), ("Workplace (Meta)", "latam"),
    ("Microsoft Viva Engage", "latam"), ("HiBob", "latam"), ("Lapzo", "latam"),
    ("Workvivo", "latam"), ("Indigital", "latam"), ("Esigtek", "latam"),
    ("Defontana", "latam"), ("Novasoft", "latam"), ("PeopleForce", "latam"),
    ("Sesame HR", "latam"), ("Talento Zeus", "latam"), ("Worky", "latam"),
    ("Tress", "latam"), ("Fortia", "latam"), ("Meta4 (Cegid)", "latam"),
    ("Digitalware", "latam"), ("Heinsohn", "latam"), ("SAP SuccessFactors", "latam"),
    ("Workday", "latam"), ("Crehana", "latam"), ("UBits", "latam"),
    ("Talento Cloud", "latam"), ("Connecto", "latam"), ("Solides", "latam"),
    ("Dialog", "latam"), ("Convenia", "latam"), ("Beehome", "latam"),
    ("Alest", "latam"), ("Comunitive", "latam"), ("Hywork", "latam"),
    // EMEA
    ("Beekeeper", "emea"), ("Flip", "emea"), ("Staffbase", "emea"), ("Sage", "emea"),
    ("Bizneo", "emea"), ("Sesame", "emea"), ("Blink", "emea"), ("Sociabble", "emea"),
    ("Zucchetti", "emea"), ("Yoobic", "emea"), ("Personio", "emea"),
    // North America
    ("Simpplr", "north_america"), ("Firstup", "north_america"),
    ("Igloo Software", "north_america"), ("LumApps", "north_america"),
    ("Unily", "north_america"), ("Haiilo", "north_america"),
    ("Interact", "north_america"), ("Jostle", "north_america"),
    ("Poppulo", "north_america"), ("Connecteam", "north_america"),
    ("Assembly", "north_america"), ("BambooHR", "north_america"),
    ("Paylocity", "north_america"), ("Rippling", "north_america"),
    ("Culture Amp", "north_america"), ("Qualtrics", "north_america"),
    ("Lattice", "north_america"), ("15Five", "north_america"),
    ("WorkTango", "north_america"), ("Glint", "north_america"),
    ("Microsoft Teams", "north_america"), ("Slack", "north_america"),
    ("Google Workspace", "north_america"), ("SharePoint", "north_america"),
    ("Speakapp", "north_america"), ("Workable", "north_america"),
    // APAC
    ("Workjam", "apac"), ("Lark", "apac"), ("Simplrr", "apac"), ("Weconnect", "apac"),
];
