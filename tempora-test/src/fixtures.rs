//! Catalog documents used across the test suites

use tempora_engine::{DocumentTree, TreeNode};

/// One `<book>` of the catalog fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub category: &'static str,
    pub title: &'static str,
    pub lang: &'static str,
    pub author: &'static str,
    pub year: &'static str,
    pub price: &'static str,
}

pub const BOOKS: [Book; 4] = [
    Book {
        category: "cooking",
        title: "Everyday Italian",
        lang: "en",
        author: "Giada De Laurentiis",
        year: "2005",
        price: "30.00",
    },
    Book {
        category: "children",
        title: "Harry Potter",
        lang: "en",
        author: "J K. Rowling",
        year: "2005",
        price: "29.99",
    },
    Book {
        category: "web",
        title: "XQuery Kick Start",
        lang: "en",
        author: "James McGovern",
        year: "2003",
        price: "49.99",
    },
    Book {
        category: "web",
        title: "Learning XML",
        lang: "en",
        author: "Erik T. Ray",
        year: "2003",
        price: "39.95",
    },
];

impl Book {
    pub fn to_tree(&self) -> TreeNode {
        TreeNode::element("book")
            .with_attribute("category", self.category)
            .with_child(
                TreeNode::element("title")
                    .with_attribute("lang", self.lang)
                    .with_text(self.title),
            )
            .with_child(TreeNode::leaf("author", self.author))
            .with_child(TreeNode::leaf("year", self.year))
            .with_child(TreeNode::leaf("price", self.price))
    }

    /// Compact markup of the book as loaded
    pub fn markup(&self) -> String {
        format!(
            "<book category=\"{}\"><title lang=\"{}\">{}</title><author>{}</author>\
             <year>{}</year><price>{}</price></book>",
            self.category, self.lang, self.title, self.author, self.year, self.price
        )
    }
}

/// A `<catalog>` document holding `books` in order
pub fn catalog_tree(name: &str, books: &[Book]) -> DocumentTree {
    let root = books
        .iter()
        .fold(TreeNode::element("catalog"), |root, book| root.with_child(book.to_tree()));
    DocumentTree::new(name, root).with_header("<?xml version=\"1.0\" encoding=\"UTF-8\"?>")
}

pub fn three_book_catalog() -> DocumentTree {
    catalog_tree("catalog", &BOOKS[..3])
}

pub fn four_book_catalog() -> DocumentTree {
    catalog_tree("catalog", &BOOKS)
}

/// Two books under a default namespace, with a prefixed review namespace declared on the root
pub fn namespaced_catalog() -> DocumentTree {
    let root = TreeNode::element("catalog")
        .with_namespace("", "urn:tempora:books")
        .with_namespace("r", "urn:tempora:reviews")
        .with_child(BOOKS[0].to_tree())
        .with_child(
            BOOKS[1]
                .to_tree()
                .with_child(TreeNode::leaf("r:review", "Magical").with_attribute("r:stars", "5")),
        );
    DocumentTree::new("library", root)
}
